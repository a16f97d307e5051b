//! Outcome of an execution.

use veil_llm::{CompletionResponse, ProviderError};

/// What [`Orchestrator::execute`](crate::Orchestrator::execute) produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// A provider answered; content is de-anonymized
    Success {
        /// Provider response
        response: CompletionResponse,
        /// Input plus output tokens
        tokens_used: u32,
    },

    /// The estimated cost does not fit the remaining budget
    CostLimitExceeded,

    /// No provider matches the routing preference
    ProviderUnavailable,

    /// Every candidate failed, the deadline passed, or the call was cancelled
    Error {
        /// Human-readable summary
        message: String,
        /// Last provider error, absent for timeout and cancellation
        cause: Option<ProviderError>,
    },
}

impl ExecutionResult {
    /// Whether a provider answered.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether trying again later might succeed.
    ///
    /// Budget denial and a missing provider are not transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The provider response, if any.
    #[must_use]
    pub fn response(&self) -> Option<&CompletionResponse> {
        match self {
            Self::Success { response, .. } => Some(response),
            _ => None,
        }
    }
}
