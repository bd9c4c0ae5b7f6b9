/// Unified error types for Velo Harvest.
use thiserror::Error;

/// Errors raised while fetching counter data from the mobility API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("resource not found (404): {url}")]
    NotFound { url: String },

    #[error("request unsuccessful: status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Whether this error is the per-request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout(_))
    }
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;
