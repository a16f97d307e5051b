//! Core LLM provider trait and request/response types.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Trait for LLM providers, cloud or on-device.
///
/// Provider implementations must be thread-safe (Send + Sync); the
/// orchestrator shares them across concurrent executions.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a prompt with a single response.
    ///
    /// # Errors
    /// Returns one of the [`ProviderError`](crate::ProviderError) kinds; the
    /// kind decides whether the caller retries, waits, or moves on.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the capabilities of this provider.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Get the unique name of this provider.
    fn name(&self) -> &str;
}

/// Capabilities of an LLM provider.
///
/// Used by the selector to order candidates for a routing preference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// Maximum context window size in tokens
    pub max_context_tokens: usize,

    /// Whether this is a local provider (no data leaves the machine)
    pub is_local: bool,

    /// Supports structured output (JSON mode, etc.)
    pub supports_structured_output: bool,

    /// Model name or identifier
    pub model_name: String,

    /// Relative cost per token (0 = free/local, higher = more expensive)
    pub cost_tier: u8,
}

/// Request for LLM completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The prompt text
    pub prompt: String,

    /// Model hint; providers use their configured model when absent
    pub model: Option<String>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,

    /// System prompt (optional)
    pub system_prompt: Option<String>,
}

impl CompletionRequest {
    /// Default output token limit.
    pub const DEFAULT_MAX_TOKENS: u32 = 1024;

    /// Default sampling temperature.
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    /// Create a new completion request for a prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            temperature: Self::DEFAULT_TEMPERATURE,
            system_prompt: None,
        }
    }

    /// Set the model hint.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the maximum tokens to generate.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// Response from LLM completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response; used as the cost table key
    pub model: String,

    /// Token counts reported by the provider
    pub usage: Usage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Input tokens consumed
    pub input_tokens: u32,

    /// Output tokens generated
    pub output_tokens: u32,
}

impl Usage {
    /// Get total tokens used.
    #[must_use]
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}
