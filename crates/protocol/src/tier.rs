use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum TierType {
    Pgu,
    Special,
    Other(String),
}

impl From<String> for TierType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PGU" => Self::Pgu,
            "SPECIAL" => Self::Special,
            _ => Self::Other(raw),
        }
    }
}

impl From<TierType> for String {
    fn from(tier_type: TierType) -> Self {
        match tier_type {
            TierType::Pgu => "PGU".to_string(),
            TierType::Special => "SPECIAL".to_string(),
            TierType::Other(raw) => raw,
        }
    }
}

/// One difficulty tier as served by `GET /difficulties`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyTier {
    pub id: u64,
    pub name: String,
    pub sort_order: i64,
    #[serde(rename = "type")]
    #[schemars(with = "String")]
    pub tier_type: TierType,
    #[serde(default)]
    pub base_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl DifficultyTier {
    #[must_use]
    pub fn new(id: u64, name: &str, sort_order: i64, tier_type: TierType) -> Self {
        Self {
            id,
            name: name.to_string(),
            sort_order,
            tier_type,
            base_score: 0.0,
            color: None,
            icon: None,
        }
    }

    #[must_use]
    pub fn pgu(id: u64, name: &str, sort_order: i64) -> Self {
        Self::new(id, name, sort_order, TierType::Pgu)
    }

    #[must_use]
    pub fn special(id: u64, name: &str, sort_order: i64) -> Self {
        Self::new(id, name, sort_order, TierType::Special)
    }
}
