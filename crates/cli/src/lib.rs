//! HTTP transport, facet flags and terminal output for `catalog-browse`.

pub mod facets;
pub mod http;
pub mod render;

pub use facets::SearchFacets;
pub use http::HttpCatalog;
