use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use catalog_protocol::DEFAULT_PAGE_LIMIT;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::range::{RangeSelection, TierBounds};

pub const ENV_BASE_URL: &str = "CATALOG_BROWSE_BASE_URL";
pub const ENV_PAGE_LIMIT: &str = "CATALOG_BROWSE_PAGE_LIMIT";
pub const ENV_TIMEOUT_SECS: &str = "CATALOG_BROWSE_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointConfig {
    pub base_url: String,
    pub search_path: String,
    pub by_id_path: String,
    pub difficulties_path: String,
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/v2/database/levels".to_string(),
            search_path: "/search".to_string(),
            by_id_path: "/byId".to_string(),
            difficulties_path: "/difficulties".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Session settings for the browser core.
///
/// ```toml
/// page_limit = 50
/// fallback_low_tier = "P1"
/// fallback_high_tier = "U20"
/// default_span = { low = 1, high = 60 }
/// query_debounce_ms = 500
///
/// [endpoint]
/// base_url = "https://catalog.example/v2/database/levels"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrowseConfig {
    pub page_limit: u64,
    /// PGU names used while the taxonomy is empty.
    pub fallback_low_tier: String,
    pub fallback_high_tier: String,
    /// Slider span used while the taxonomy is empty.
    pub default_span: RangeSelection,
    pub query_debounce_ms: u64,
    pub endpoint: EndpointConfig,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
            fallback_low_tier: "P1".to_string(),
            fallback_high_tier: "U20".to_string(),
            default_span: RangeSelection::new(1, 60),
            query_debounce_ms: 500,
            endpoint: EndpointConfig::default(),
        }
    }
}

/// Largest page the catalog is asked for.
pub const MAX_PAGE_LIMIT: u64 = 1000;

impl BrowseConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(raw).context("Failed to parse browse config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Applies `CATALOG_BROWSE_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.endpoint.base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_PAGE_LIMIT) {
            self.page_limit = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_PAGE_LIMIT}={raw} is not a number"))?;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.endpoint.timeout_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_SECS}={raw} is not a number"))?;
        }
        self.validate()?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), SearchError> {
        if self.page_limit == 0 {
            return Err(SearchError::Config("page_limit must be > 0".to_string()));
        }
        if self.page_limit > MAX_PAGE_LIMIT {
            return Err(SearchError::Config(format!(
                "page_limit must be <= {MAX_PAGE_LIMIT} (got {})",
                self.page_limit
            )));
        }
        if self.fallback_low_tier.trim().is_empty() || self.fallback_high_tier.trim().is_empty() {
            return Err(SearchError::Config(
                "fallback tier names must not be empty".to_string(),
            ));
        }
        if self.default_span.low > self.default_span.high {
            return Err(SearchError::Config(format!(
                "default_span is inverted ({} > {})",
                self.default_span.low, self.default_span.high
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn fallback_bounds(&self) -> TierBounds {
        TierBounds::new(&self.fallback_low_tier, &self.fallback_high_tier)
    }

    #[must_use]
    pub const fn query_debounce(&self) -> Duration {
        Duration::from_millis(self.query_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = BrowseConfig::from_toml_str(
            r#"
            page_limit = 20

            [endpoint]
            base_url = "https://catalog.test/levels"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.page_limit, 20);
        assert_eq!(cfg.endpoint.base_url, "https://catalog.test/levels");
        assert_eq!(cfg.endpoint.search_path, "/search");
        assert_eq!(cfg.fallback_bounds(), TierBounds::new("P1", "U20"));
        assert_eq!(cfg.query_debounce(), Duration::from_millis(500));
    }

    #[test]
    fn rejects_zero_page_limit_and_unknown_keys() {
        assert!(BrowseConfig::from_toml_str("page_limit = 0").is_err());
        assert!(BrowseConfig::from_toml_str("page_size = 10").is_err());
    }

    #[test]
    fn oversized_page_limit_is_rejected() {
        assert!(BrowseConfig::from_toml_str("page_limit = 1000").is_ok());
        let err = BrowseConfig::from_toml_str("page_limit = 1001").unwrap_err();
        assert!(format!("{err:#}").contains("page_limit must be <= 1000"));

        let mut cfg = BrowseConfig::default();
        let err = cfg
            .apply_overrides(|key| (key == ENV_PAGE_LIMIT).then(|| u64::MAX.to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("page_limit must be <= 1000"));
    }

    #[test]
    fn env_overrides_apply_on_top() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_BASE_URL, " https://override.test "),
            (ENV_PAGE_LIMIT, "25"),
        ]);
        let mut cfg = BrowseConfig::default();
        cfg.apply_overrides(|key| env.get(key).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(cfg.endpoint.base_url, "https://override.test");
        assert_eq!(cfg.page_limit, 25);
        assert_eq!(cfg.endpoint.timeout_secs, 30);

        let mut cfg = BrowseConfig::default();
        assert!(cfg
            .apply_overrides(|key| (key == ENV_PAGE_LIMIT).then(|| "lots".to_string()))
            .is_err());
    }
}
