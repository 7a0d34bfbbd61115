//! Difficulty-range faceted search over the level catalog.
//!
//! [`Browser`] owns the committed [`FilterState`], the two range sliders and
//! the paged result list. Slider drags stay local; every commit advances the
//! [`Epoch`] and restarts paging from offset 0, and completions from older
//! epochs are dropped.

mod accumulator;
mod browser;
mod config;
mod debounce;
mod error;
mod fetch;
mod filter;
mod query;
mod range;
mod slider;
mod taxonomy;

pub use accumulator::ResultAccumulator;
pub use browser::{BrowseUpdate, Browser};
pub use config::{
    BrowseConfig, EndpointConfig, ENV_BASE_URL, ENV_PAGE_LIMIT, ENV_TIMEOUT_SECS, MAX_PAGE_LIMIT,
};
pub use debounce::QueryDebounce;
pub use error::{Result, SearchError};
pub use fetch::{
    fetch_page, CatalogClient, FetchCompletion, FetchOutcome, PageData, PageFetcher, Reconciled,
    TaxonomySource,
};
pub use filter::{Epoch, FilterState, FilterStore, Role};
pub use query::{build_request, effective_special_tiers, parse_id_shortcut};
pub use range::{
    family_span, names_in_range, resolve_bound, resolve_range, to_indices, to_tier_names, Bound,
    RangeSelection, TierBounds,
};
pub use slider::{Knob, RangeCommit, SliderController, SliderKind, SliderPhase};
pub use taxonomy::{family_of, SpecialGroup, Taxonomy, TierFamily};
