//! HTTP generation provider
//!
//! A generic adapter for OpenAI-compatible generation endpoints. Most
//! hosted generation APIs (and local gateways in front of them) speak
//! this shape, so one adapter covers many deployments; anything more
//! exotic implements [`Provider`] directly.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderErrorCode};
use crate::provider::{ExecuteOptions, Provider, ProviderInput, ProviderResult};

/// Configuration for one HTTP provider instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpProviderConfig {
    /// Provider ID used in mappings and transaction records
    pub id: String,
    /// Base URL of the API, without a trailing slash
    pub base_url: String,
    /// Bearer token, if the endpoint requires one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model name sent with every request
    pub model: String,
    /// Request deadline in seconds (default 120)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    120
}

/// Provider speaking the OpenAI-compatible chat completions protocol
pub struct HttpProvider {
    config: HttpProviderConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl HttpProvider {
    /// Create a provider from its config
    pub fn new(config: HttpProviderConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn request_timeout(&self, options: &ExecuteOptions) -> Duration {
        options
            .timeout
            .unwrap_or(Duration::from_secs(self.config.timeout_secs))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

/// Map an HTTP status to the provider error taxonomy
fn error_for_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    let code = match status.as_u16() {
        401 | 403 => ProviderErrorCode::AuthenticationFailed,
        429 => ProviderErrorCode::RateLimited,
        402 => ProviderErrorCode::QuotaExceeded,
        400 | 422 => ProviderErrorCode::InvalidInput,
        500..=599 => ProviderErrorCode::ProviderUnavailable,
        _ => ProviderErrorCode::UnknownError,
    };
    let message = if body.is_empty() {
        format!("upstream returned {}", status)
    } else {
        format!("upstream returned {}: {}", status, truncate(body, 200))
    };
    ProviderError::new(code, message)
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn error_for_transport(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(format!("request timed out: {}", err))
    } else if err.is_connect() {
        ProviderError::unavailable(format!("connection failed: {}", err))
    } else {
        ProviderError::unknown(format!("transport error: {}", err))
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn id(&self) -> &str {
        &self.config.id
    }

    async fn is_available(&self) -> bool {
        let health_url = self.endpoint("/v1/models");
        match self
            .authorize(self.client.get(&health_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                log::debug!("provider '{}' health check failed: {}", self.config.id, err);
                false
            }
        }
    }

    fn validate_input(&self, input: &ProviderInput) -> Result<(), ProviderError> {
        let prompt = input.get("prompt").and_then(|v| v.as_str());
        match prompt {
            Some(text) if !text.trim().is_empty() => Ok(()),
            Some(_) => Err(ProviderError::invalid_input("prompt must not be empty")),
            None => Err(ProviderError::invalid_input("missing 'prompt' input")),
        }
    }

    async fn execute(
        &self,
        input: ProviderInput,
        options: &ExecuteOptions,
    ) -> Result<ProviderResult, ProviderError> {
        if options.is_aborted() {
            return Err(ProviderError::unknown("execution aborted before dispatch")
                .with_retryable(false));
        }

        // validate_input already ran in the chain, but this provider can
        // also be called directly
        self.validate_input(&input)?;
        let prompt = input
            .get("prompt")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .authorize(self.client.post(self.endpoint("/v1/chat/completions")))
            .timeout(self.request_timeout(options))
            .json(&request)
            .send()
            .await
            .map_err(error_for_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_output(format!("malformed response: {}", e)))?;

        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| ProviderError::invalid_output("response carried no content"))?;

        let mut outputs = std::collections::HashMap::new();
        outputs.insert("text".to_string(), serde_json::json!(content));

        Ok(ProviderResult::new(self.config.id.clone(), outputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> HttpProvider {
        HttpProvider::new(HttpProviderConfig {
            id: "gateway".into(),
            base_url: "http://127.0.0.1:9999".into(),
            api_key: None,
            model: "default".into(),
            timeout_secs: 120,
        })
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (401, ProviderErrorCode::AuthenticationFailed),
            (403, ProviderErrorCode::AuthenticationFailed),
            (429, ProviderErrorCode::RateLimited),
            (402, ProviderErrorCode::QuotaExceeded),
            (400, ProviderErrorCode::InvalidInput),
            (422, ProviderErrorCode::InvalidInput),
            (500, ProviderErrorCode::ProviderUnavailable),
            (503, ProviderErrorCode::ProviderUnavailable),
            (418, ProviderErrorCode::UnknownError),
        ];
        for (status, expected) in cases {
            let err = error_for_status(reqwest::StatusCode::from_u16(status).unwrap(), "");
            assert_eq!(err.code, expected, "status {}", status);
        }
    }

    #[test]
    fn test_invalid_input_is_non_retryable() {
        let err = error_for_status(reqwest::StatusCode::BAD_REQUEST, "bad prompt");
        assert!(!err.retryable);
        assert!(err.message.contains("bad prompt"));
    }

    #[test]
    fn test_validate_input_requires_prompt() {
        let p = provider();

        let mut input = ProviderInput::new();
        assert!(p.validate_input(&input).is_err());

        input.insert("prompt".into(), serde_json::json!("   "));
        assert!(p.validate_input(&input).is_err());

        input.insert("prompt".into(), serde_json::json!("a lighthouse"));
        assert!(p.validate_input(&input).is_ok());
    }

    #[test]
    fn test_config_defaults_timeout() {
        let config: HttpProviderConfig = serde_json::from_value(serde_json::json!({
            "id": "gateway",
            "baseUrl": "https://api.example.com",
            "model": "default"
        }))
        .unwrap();
        assert_eq!(config.timeout_secs, 120);
        assert!(config.api_key.is_none());
    }

    #[tokio::test]
    async fn test_aborted_call_never_dispatches() {
        let p = provider();
        let flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
        let options = ExecuteOptions {
            abort: Some(flag),
            ..ExecuteOptions::default()
        };

        let mut input = ProviderInput::new();
        input.insert("prompt".into(), serde_json::json!("hello"));

        let err = p.execute(input, &options).await.unwrap_err();
        assert!(!err.retryable);
        assert!(err.message.contains("aborted"));
    }
}
