use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use catalog_protocol::{DifficultyTier, Entry, Page, SearchRequest, SearchResponse};
use catalog_search::{CatalogClient, EndpointConfig, SearchError, TaxonomySource};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

const MAX_ERROR_BODY: usize = 200;

/// Catalog over HTTP. Timeouts are enforced by the underlying client.
pub struct HttpCatalog {
    client: Client,
    endpoint: EndpointConfig,
}

impl HttpCatalog {
    pub fn new(endpoint: EndpointConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(endpoint.timeout_secs.max(1)))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, endpoint })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn search_url(&self) -> String {
        self.url(&self.endpoint.search_path)
    }

    pub fn by_id_url(&self, id: u64) -> String {
        format!("{}/{id}", self.url(&self.endpoint.by_id_path))
    }

    pub fn difficulties_url(&self) -> String {
        self.url(&self.endpoint.difficulties_path)
    }
}

fn transport(err: reqwest::Error) -> SearchError {
    if err.is_timeout() {
        SearchError::Transport(format!("request timed out: {err}"))
    } else {
        SearchError::Transport(err.to_string())
    }
}

fn status_error(status: StatusCode, body: &str) -> SearchError {
    let mut message: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
    if message.is_empty() {
        message = status.canonical_reason().unwrap_or("no body").to_string();
    }
    SearchError::Status {
        status: status.as_u16(),
        message,
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> catalog_search::Result<T> {
    let status = response.status();
    let body = response.text().await.map_err(transport)?;
    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl CatalogClient for HttpCatalog {
    async fn search(
        &self,
        request: &SearchRequest,
        page: Page,
    ) -> catalog_search::Result<SearchResponse> {
        let url = self.search_url();
        log::debug!("POST {url} offset={} limit={}", page.offset, page.limit);
        let response = self
            .client
            .post(&url)
            .query(&request.query_params(page))
            .json(&request.body)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn by_id(&self, id: u64) -> catalog_search::Result<Option<Entry>> {
        let url = self.by_id_url(id);
        log::debug!("GET {url}");
        let response = self.client.get(&url).send().await.map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(response).await.map(Some)
    }
}

#[async_trait]
impl TaxonomySource for HttpCatalog {
    async fn difficulties(&self) -> catalog_search::Result<Vec<DifficultyTier>> {
        let url = self.difficulties_url();
        log::debug!("GET {url}");
        let response = self.client.get(&url).send().await.map_err(transport)?;
        read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(base_url: &str) -> HttpCatalog {
        HttpCatalog::new(EndpointConfig {
            base_url: base_url.to_string(),
            ..EndpointConfig::default()
        })
        .expect("client")
    }

    #[test]
    fn urls_join_without_double_slashes() {
        let http = catalog("https://catalog.test/v2/database/levels/");
        assert_eq!(
            http.search_url(),
            "https://catalog.test/v2/database/levels/search"
        );
        assert_eq!(
            http.by_id_url(42),
            "https://catalog.test/v2/database/levels/byId/42"
        );
        assert_eq!(
            http.difficulties_url(),
            "https://catalog.test/v2/database/levels/difficulties"
        );
    }

    #[test]
    fn status_errors_keep_a_short_body() {
        let long = "x".repeat(1000);
        match status_error(StatusCode::BAD_GATEWAY, &long) {
            SearchError::Status { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message.len(), MAX_ERROR_BODY);
            }
            other => panic!("unexpected {other:?}"),
        }
        let err = status_error(StatusCode::SERVICE_UNAVAILABLE, "  ");
        assert!(err.is_transient());
        assert!(err.to_string().contains("Service Unavailable"));
        assert!(!status_error(StatusCode::BAD_REQUEST, "bad sort").is_transient());
    }
}
