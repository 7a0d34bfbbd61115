use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod tier;

pub use tier::{DifficultyTier, TierType};

/// Default number of entries requested per page.
pub const DEFAULT_PAGE_LIMIT: u64 = 50;

/// Tri-state visibility switch for a boolean entry attribute.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Show,
    Hide,
    Only,
}

impl Visibility {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Hide => "hide",
            Self::Only => "only",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "show" => Ok(Self::Show),
            "hide" => Ok(Self::Hide),
            "only" => Ok(Self::Only),
            other => Err(format!("unknown visibility '{other}' (expected show|hide|only)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    Recent,
    Difficulty,
    Clears,
    Likes,
    RatingAccuracy,
    RatingAccuracyVotes,
    Random,
}

impl SortKey {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recent => "RECENT",
            Self::Difficulty => "DIFF",
            Self::Clears => "CLEARS",
            Self::Likes => "LIKES",
            Self::RatingAccuracy => "RATING_ACCURACY",
            Self::RatingAccuracyVotes => "RATING_ACCURACY_VOTES",
            Self::Random => "RANDOM",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "RECENT" => Ok(Self::Recent),
            "DIFF" | "DIFFICULTY" => Ok(Self::Difficulty),
            "CLEARS" => Ok(Self::Clears),
            "LIKES" => Ok(Self::Likes),
            "RATING_ACCURACY" => Ok(Self::RatingAccuracy),
            "RATING_ACCURACY_VOTES" => Ok(Self::RatingAccuracyVotes),
            "RANDOM" => Ok(Self::Random),
            other => Err(format!("unknown sort key '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            other => Err(format!("unknown sort order '{other}' (expected ASC|DESC)")),
        }
    }
}

/// Sort key plus direction. Serialized as `<KEY>_<ORDER>`; `RANDOM` has no direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SortMode {
    pub key: SortKey,
    pub order: SortOrder,
}

impl SortMode {
    #[must_use]
    pub const fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    #[must_use]
    pub fn wire(&self) -> String {
        match self.key {
            SortKey::Random => SortKey::Random.as_str().to_string(),
            key => format!("{}_{}", key.as_str(), self.order.as_str()),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        let raw = raw.trim().to_ascii_uppercase();
        if let Some(key) = raw.strip_suffix("_ASC") {
            return Ok(Self::new(key.parse()?, SortOrder::Asc));
        }
        if let Some(key) = raw.strip_suffix("_DESC") {
            return Ok(Self::new(key.parse()?, SortOrder::Desc));
        }
        Ok(Self::new(raw.parse()?, SortOrder::default()))
    }
}

impl From<SortMode> for String {
    fn from(mode: SortMode) -> Self {
        mode.wire()
    }
}

impl TryFrom<String> for SortMode {
    type Error = String;

    fn try_from(raw: String) -> std::result::Result<Self, Self::Error> {
        raw.parse()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Page {
    #[must_use]
    pub const fn nth(number: u64, limit: u64) -> Self {
        Self {
            offset: number.saturating_mul(limit),
            limit,
        }
    }

    #[must_use]
    pub const fn number(&self) -> u64 {
        if self.limit == 0 {
            0
        } else {
            self.offset / self.limit
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct PguRange {
    pub from: String,
    pub to: String,
}

/// JSON body of `POST /search`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
    pub pgu_range: PguRange,
    #[serde(default)]
    pub special_difficulties: Vec<String>,
}

/// Query string of `POST /search`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub limit: u64,
    pub offset: u64,
    pub query: String,
    pub sort: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_filter: Option<Visibility>,
    pub cleared_filter: Visibility,
    pub available_dl_filter: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_my_likes: Option<bool>,
    /// Comma-joined curation type names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curated_types_filter: Option<String>,
    /// Comma-joined tag names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags_filter: Option<String>,
}

/// Faceted search request, independent of the page being fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub sort: SortMode,
    pub cleared: Visibility,
    /// `None` when the caller is not allowed to see deleted entries.
    pub deleted: Option<Visibility>,
    pub available_download: Visibility,
    /// `None` for anonymous callers.
    pub only_my_likes: Option<bool>,
    pub curation_types: Vec<String>,
    pub tags: Vec<String>,
    pub body: SearchBody,
}

fn join_names(names: &[String]) -> Option<String> {
    (!names.is_empty()).then(|| names.join(","))
}

impl SearchRequest {
    #[must_use]
    pub fn query_params(&self, page: Page) -> SearchQuery {
        SearchQuery {
            limit: page.limit,
            offset: page.offset,
            query: self.query.clone(),
            sort: self.sort.wire(),
            deleted_filter: self.deleted,
            cleared_filter: self.cleared,
            available_dl_filter: self.available_download,
            only_my_likes: self.only_my_likes,
            curated_types_filter: join_names(&self.curation_types),
            tags_filter: join_names(&self.tags),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireRequest {
    /// `GET /byId/:id`; all other facets are ignored.
    ById { id: u64 },
    /// `POST /search`.
    Search(SearchRequest),
}

impl WireRequest {
    #[must_use]
    pub const fn is_id_lookup(&self) -> bool {
        matches!(self, Self::ById { .. })
    }
}

/// One catalog entry. Only `id` matters here; the rest is passed through untouched.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct Entry {
    pub id: u64,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Entry {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            fields: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(serde_json::Value::as_str)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Entry>,
    pub count: u64,
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}
