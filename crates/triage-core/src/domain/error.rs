//! Error taxonomy for triage runs.

/// Failure reported by a [`BuildSource`](crate::source::BuildSource) call.
///
/// A run never aborts on one of these; the affected build is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("resource not found: {resource}")]
    NotFound { resource: String },

    #[error("not authorized to read {resource}")]
    Unauthorized { resource: String },

    #[error("unexpected HTTP status {status} for {resource}")]
    Status { status: u16, resource: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Triage domain errors.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("invalid ignore pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("similarity threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for TriageError {
    fn from(err: toml::de::Error) -> Self {
        TriageError::Config(err.to_string())
    }
}

/// Result type for triage operations.
pub type Result<T> = std::result::Result<T, TriageError>;

/// Result type for collaborator fetches.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
