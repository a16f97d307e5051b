//! Local models served by Ollama.

use super::common::{build_http_client, error_from_response};
use crate::error::{ProviderError, Result};
use crate::provider::{
    CompletionRequest, CompletionResponse, LlmProvider, ProviderCapabilities, Usage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Provider backed by a local Ollama daemon; prompts never leave the machine.
pub struct OllamaProvider {
    model: String,
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    /// Provider for `llama3.1:8b` on the default local port.
    pub fn new() -> Result<Self> {
        Self::with_model("llama3.1:8b")
    }

    /// Provider for `model` on the default local port.
    pub fn with_model(model: impl Into<String>) -> Result<Self> {
        Self::with_url("http://localhost:11434", model)
    }

    /// Provider for `model` served at `base_url`.
    pub fn with_url(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Ok(Self {
            model: model.into(),
            client: build_http_client(Some(120))?,
            base_url: base_url.into(),
        })
    }

    /// Build the `/api/generate` body.
    fn to_api_request(&self, request: &CompletionRequest) -> OllamaRequest {
        OllamaRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            prompt: request.prompt.clone(),
            system: request.system_prompt.clone(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: i32::try_from(request.max_tokens).unwrap_or(i32::MAX),
            },
        }
    }

    /// Token counts come from the eval counters; absent counters read as zero.
    fn convert_api_response(response: OllamaResponse) -> CompletionResponse {
        CompletionResponse {
            content: response.response,
            model: response.model,
            usage: Usage {
                input_tokens: response.prompt_eval_count.unwrap_or(0),
                output_tokens: response.eval_count.unwrap_or(0),
            },
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let api_request = self.to_api_request(&request);

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&api_request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response("ollama", response).await);
        }

        let api_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Generic(format!("ollama: failed to parse response: {e}")))?;

        Ok(Self::convert_api_response(api_response))
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            max_context_tokens: 8192,
            is_local: true,
            supports_structured_output: false,
            model_name: self.model.clone(),
            cost_tier: 0,
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

// Wire types for /api/generate

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: i32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    response: String,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}
