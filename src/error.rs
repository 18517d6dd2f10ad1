//! Error types for holomem.

use thiserror::Error;

/// holomem error types.
#[derive(Error, Debug)]
pub enum HolomemError {
    /// A required setting, credential or endpoint is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Personality vector construction failed.
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Memory synchronisation with the persistence collaborator failed.
    #[error("Sync error: {0}")]
    Sync(String),

    /// A bounded async step did not finish in time.
    #[error("Timeout while executing '{operation}' after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Invalid vector dimensions
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Empty input where non-empty was required
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A processing context carried unknown or malformed fields.
    #[error("Invalid process context: {0}")]
    InvalidContext(String),

    /// The persistence collaborator rejected a request.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The embedding collaborator returned an error or an unusable payload.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport failure talking to a remote collaborator.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HolomemError {
    /// Whether the controller recovers from this error by changing state
    /// instead of surfacing it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Initialization(_) | Self::Sync(_) | Self::Timeout { .. }
        )
    }
}

/// Result type alias for holomem operations.
pub type Result<T> = std::result::Result<T, HolomemError>;
