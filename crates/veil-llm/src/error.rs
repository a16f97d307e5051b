//! Error types for provider calls.

use thiserror::Error;

/// Errors a provider can raise from `complete`.
///
/// The set is closed: the orchestrator's retry policy matches it exhaustively.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Request throttled; retry the same provider after the given delay
    #[error("rate limited{}", retry_hint(.retry_after_ms))]
    RateLimited {
        /// Delay requested by the provider, in milliseconds
        retry_after_ms: Option<u64>,
    },

    /// Account quota or credit exhausted
    #[error("quota exceeded")]
    QuotaExceeded,

    /// Provider unreachable or reporting an outage
    #[error("provider unavailable")]
    Unavailable,

    /// Any other failure
    #[error("{0}")]
    Generic(String),
}

#[allow(clippy::ref_option)]
fn retry_hint(retry_after_ms: &Option<u64>) -> String {
    retry_after_ms.map_or_else(String::new, |ms| format!(" (retry after {ms}ms)"))
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Unavailable
        } else {
            Self::Generic(format!("network error: {err}"))
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Generic(format!("serialization error: {err}"))
    }
}

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
