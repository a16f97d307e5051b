//! Common utilities shared across HTTP providers.

use crate::error::{ProviderError, Result};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Build a standard HTTP client with common timeout settings.
///
/// # Arguments
/// * `timeout_secs` - Timeout in seconds (defaults to 60 if not specified)
///
/// # Errors
/// Returns error if the HTTP client cannot be created.
pub fn build_http_client(timeout_secs: Option<u64>) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.unwrap_or(60)))
        .build()
        .map_err(|e| ProviderError::Generic(format!("failed to create HTTP client: {e}")))
}

/// Map an unsuccessful HTTP response onto the provider error kinds.
///
/// - 429 with an `insufficient_quota` body → `QuotaExceeded`
/// - other 429 → `RateLimited`, honouring `Retry-After` (seconds)
/// - 402 → `QuotaExceeded`
/// - 5xx → `Unavailable`
/// - anything else → `Generic`
#[must_use]
pub fn classify_http_error(
    provider: &str,
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
) -> ProviderError {
    match status {
        StatusCode::TOO_MANY_REQUESTS if body.contains("insufficient_quota") => {
            ProviderError::QuotaExceeded
        }
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
            retry_after_ms: retry_after_ms(headers),
        },
        StatusCode::PAYMENT_REQUIRED => ProviderError::QuotaExceeded,
        s if s.is_server_error() => ProviderError::Unavailable,
        s => ProviderError::Generic(format!("{provider}: status {}, {body}", s.as_u16())),
    }
}

/// Turn a non-success response into a `ProviderError`, consuming the body.
pub async fn error_from_response(provider: &str, response: Response) -> ProviderError {
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    let err = classify_http_error(provider, status, &headers, &body);
    tracing::debug!("{} returned {}: {}", provider, status, err);
    err
}

fn retry_after_ms(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .and_then(|wait| u64::try_from(wait.as_millis()).ok())
}

/// Common message structure for `OpenAI`-compatible APIs.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StandardMessage {
    /// The role of the message sender ("system", "user", "assistant")
    pub role: String,
    /// The text content of the message
    pub content: String,
}

/// Common usage statistics structure.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct StandardUsage {
    /// Number of tokens in the prompt/input
    pub prompt_tokens: u32,
    /// Number of tokens in the completion/output
    pub completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(Some(30)).is_ok());
        assert!(build_http_client(None).is_ok());
    }

    #[test]
    fn test_rate_limit_with_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("2"));

        let err = classify_http_error("openai", StatusCode::TOO_MANY_REQUESTS, &headers, "slow down");
        assert_eq!(
            err,
            ProviderError::RateLimited {
                retry_after_ms: Some(2000)
            }
        );
    }

    #[test]
    fn test_rate_limit_without_header() {
        let err = classify_http_error(
            "openai",
            StatusCode::TOO_MANY_REQUESTS,
            &HeaderMap::new(),
            "",
        );
        assert_eq!(err, ProviderError::RateLimited { retry_after_ms: None });
    }

    #[test]
    fn test_quota_errors() {
        let body = r#"{"error":{"code":"insufficient_quota"}}"#;
        let err = classify_http_error("openai", StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new(), body);
        assert_eq!(err, ProviderError::QuotaExceeded);

        let err = classify_http_error("openai", StatusCode::PAYMENT_REQUIRED, &HeaderMap::new(), "");
        assert_eq!(err, ProviderError::QuotaExceeded);
    }

    #[test]
    fn test_server_errors_are_unavailable() {
        for status in [StatusCode::BAD_GATEWAY, StatusCode::SERVICE_UNAVAILABLE] {
            let err = classify_http_error("ollama", status, &HeaderMap::new(), "");
            assert_eq!(err, ProviderError::Unavailable);
        }
    }

    #[test]
    fn test_client_errors_are_generic() {
        let err = classify_http_error("openai", StatusCode::BAD_REQUEST, &HeaderMap::new(), "bad");
        assert_eq!(
            err,
            ProviderError::Generic("openai: status 400, bad".to_string())
        );
    }
}
