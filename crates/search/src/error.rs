use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

/// Failures reported by a catalog transport.
///
/// Only these ever reach the caller; cancellation, taxonomy misses and
/// not-found id lookups are resolved inside the controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Catalog returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed catalog response: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl SearchError {
    /// Whether retrying the same page may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            Self::Decode(_) | Self::Config(_) | Self::Other(_) => false,
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
