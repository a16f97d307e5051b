//! Per-call execution settings.

use std::time::Duration;
use veil_core::OrchestratorConfig;

/// Retry, backoff and deadline settings for one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Attempts per provider before falling back; 0 behaves as 1
    pub max_retries: u32,

    /// Deadline for the whole pipeline
    pub timeout: Duration,

    /// Backoff unit, multiplied by the attempt number
    pub base_backoff: Duration,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: Duration::from_secs(60),
            base_backoff: Duration::from_secs(1),
        }
    }
}

impl ExecutionOptions {
    /// Set attempts per provider.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the pipeline deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the backoff unit.
    #[must_use]
    pub fn with_base_backoff(mut self, base_backoff: Duration) -> Self {
        self.base_backoff = base_backoff;
        self
    }

    /// Attempts actually made against each provider.
    pub(crate) fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

impl From<&OrchestratorConfig> for ExecutionOptions {
    fn from(config: &OrchestratorConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            timeout: Duration::from_millis(config.timeout_ms),
            base_backoff: Duration::from_millis(config.base_backoff_ms),
        }
    }
}
