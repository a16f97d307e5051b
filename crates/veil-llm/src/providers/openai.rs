//! `OpenAI`-compatible chat completions provider.

use super::common::{build_http_client, error_from_response, StandardMessage, StandardUsage};
use crate::error::{ProviderError, Result};
use crate::provider::{
    CompletionRequest, CompletionResponse, LlmProvider, ProviderCapabilities, Usage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Chat completions client for `OpenAI` and compatible gateways.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: Client,
    base_url: String,
}

impl OpenAiProvider {
    /// Provider for `gpt-4o-mini` authenticated with `api_key`.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_model(api_key, "gpt-4o-mini")
    }

    /// Provider for `model` authenticated with `api_key`.
    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            client: build_http_client(Some(60))?,
            base_url: "https://api.openai.com/v1".to_string(),
        })
    }

    /// Point the provider at a compatible endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the chat body: optional system message, then the user prompt.
    fn to_api_request(&self, request: &CompletionRequest) -> OpenAiRequest {
        let mut messages = Vec::with_capacity(2);

        if let Some(system) = &request.system_prompt {
            messages.push(StandardMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }

        messages.push(StandardMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        OpenAiRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    /// Take the first choice; a missing usage block reads as zero tokens.
    fn convert_api_response(response: OpenAiResponse) -> Result<CompletionResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Generic("openai: no choices in response".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content,
            model: response.model,
            usage: response.usage.map_or_else(Usage::default, |u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let api_request = self.to_api_request(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&api_request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response("openai", response).await);
        }

        let api_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Generic(format!("openai: failed to parse response: {e}")))?;

        Self::convert_api_response(api_response)
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            max_context_tokens: 128_000,
            is_local: false,
            supports_structured_output: true,
            model_name: self.model.clone(),
            cost_tier: 2,
        }
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// Wire types for /chat/completions

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<StandardMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<StandardUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: StandardMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = OpenAiProvider::new("test-key").expect("create provider");
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model, "gpt-4o-mini");
        assert!(!provider.capabilities().is_local);
    }

    #[test]
    fn test_api_request_conversion() {
        let provider = OpenAiProvider::new("test-key").expect("create provider");
        let request = CompletionRequest::new("Hello")
            .with_max_tokens(1000)
            .with_temperature(0.5)
            .with_system_prompt("You are helpful");

        let api_request = provider.to_api_request(&request);

        assert_eq!(api_request.model, "gpt-4o-mini");
        assert_eq!(api_request.max_tokens, 1000);
        assert_eq!(api_request.messages.len(), 2); // System + User
        assert_eq!(api_request.messages[0].role, "system");
        assert_eq!(api_request.messages[1].content, "Hello");
    }

    #[test]
    fn test_model_hint_overrides_default() {
        let provider = OpenAiProvider::new("test-key").expect("create provider");
        let request = CompletionRequest::new("Hello").with_model("gpt-4o");
        assert_eq!(provider.to_api_request(&request).model, "gpt-4o");
    }

    #[test]
    fn test_response_conversion() {
        let raw = r#"{
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{"message": {"role": "assistant", "content": "Hi [PERSON_NAME_1]"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 4}
        }"#;
        let parsed: OpenAiResponse = serde_json::from_str(raw).expect("parse response");
        let response = OpenAiProvider::convert_api_response(parsed).expect("convert response");

        assert_eq!(response.content, "Hi [PERSON_NAME_1]");
        assert_eq!(response.usage.input_tokens, 12);
        assert_eq!(response.usage.output_tokens, 4);
    }

    #[test]
    fn test_response_without_choices() {
        let parsed: OpenAiResponse =
            serde_json::from_str(r#"{"model": "m", "choices": []}"#).expect("parse response");
        assert!(matches!(
            OpenAiProvider::convert_api_response(parsed),
            Err(ProviderError::Generic(_))
        ));
    }
}
