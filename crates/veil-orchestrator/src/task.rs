//! Unit of work submitted to the orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use veil_llm::{CompletionRequest, RoutingPreference};

/// A single LLM request with its routing and privacy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier used in logs
    pub id: Uuid,

    /// User prompt
    pub prompt: String,

    /// Which providers to prefer
    pub preference: RoutingPreference,

    /// Model hint passed through to the provider
    pub model: Option<String>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// System prompt (optional)
    pub system_prompt: Option<String>,

    /// Replace PII with placeholders before the prompt leaves the process
    pub requires_anonymization: bool,

    /// Expected cost in USD, checked against the budget up front
    pub estimated_cost: f64,

    /// Placeholder → original, set on the pipeline's working copy
    #[serde(skip)]
    pub anonymization_mapping: Option<HashMap<String, String>>,
}

impl Task {
    /// Create a task for `prompt` with anonymization on.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: prompt.into(),
            preference: RoutingPreference::default(),
            model: None,
            max_tokens: CompletionRequest::DEFAULT_MAX_TOKENS,
            temperature: CompletionRequest::DEFAULT_TEMPERATURE,
            system_prompt: None,
            requires_anonymization: true,
            estimated_cost: 0.0,
            anonymization_mapping: None,
        }
    }

    /// Set the routing preference.
    #[must_use]
    pub fn with_preference(mut self, preference: RoutingPreference) -> Self {
        self.preference = preference;
        self
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

    /// Turn anonymization on or off.
    #[must_use]
    pub fn with_anonymization(mut self, enabled: bool) -> Self {
        self.requires_anonymization = enabled;
        self
    }

    /// Set the estimated cost in USD.
    #[must_use]
    pub fn with_estimated_cost(mut self, cost: f64) -> Self {
        self.estimated_cost = cost;
        self
    }

    /// Provider request for the task's current prompt text.
    #[must_use]
    pub fn to_request(&self) -> CompletionRequest {
        CompletionRequest {
            prompt: self.prompt.clone(),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system_prompt: self.system_prompt.clone(),
        }
    }
}
