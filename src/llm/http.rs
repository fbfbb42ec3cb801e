//! HTTP-backed generation client.
//!
//! Speaks a messages-style JSON API: instruction as the system field, the
//! state snapshot as a single user message, text blocks back.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::llm::client::{
    GenerationClient, GenerationError, GenerationRequest, GenerationResponse, TokenUsage,
};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "REDRAFT_API_KEY";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Default max tokens when the request leaves it unset.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Configuration for the HTTP generation client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Endpoint URL of the messages API
    pub endpoint: String,
    /// Model identifier sent with each request
    pub model: String,
    /// Max tokens when the request leaves it unset
    pub max_tokens: u32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HttpClientConfig {
    /// Create a config with a specific model.
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Generation client over HTTP.
pub struct HttpGenerationClient {
    client: Client,
    api_key: String,
    config: HttpClientConfig,
    usage: Arc<Mutex<TokenUsage>>,
}

impl HttpGenerationClient {
    /// Create a client, reading the API key from the environment.
    pub fn new(config: HttpClientConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| GenerationError::MissingApiKey { env_var: API_KEY_ENV.to_string() })?;
        Self::with_api_key(api_key, config)
    }

    /// Create a client with an explicit API key.
    pub fn with_api_key(api_key: String, config: HttpClientConfig) -> Result<Self, GenerationError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_key,
            config,
            usage: Arc::new(Mutex::new(TokenUsage::default())),
        })
    }

    /// Cumulative token usage across all calls on this client.
    pub fn total_usage(&self) -> TokenUsage {
        *self.usage.lock().expect("usage counter poisoned")
    }

    fn build_body(&self, request: &GenerationRequest) -> Value {
        json!({
            "model": self.config.model,
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
            "system": request.instruction,
            "messages": [
                { "role": "user", "content": request.input }
            ]
        })
    }

    fn parse_response(&self, body: Value) -> Result<GenerationResponse, GenerationError> {
        let usage = if let Some(u) = body.get("usage") {
            TokenUsage::new(
                u["input_tokens"].as_u64().unwrap_or(0),
                u["output_tokens"].as_u64().unwrap_or(0),
            )
        } else {
            TokenUsage::default()
        };

        {
            let mut total = self.usage.lock().expect("usage counter poisoned");
            total.add(&usage);
        }

        let mut text = String::new();
        if let Some(blocks) = body["content"].as_array() {
            for block in blocks {
                if block["type"].as_str() == Some("text") {
                    if let Some(t) = block["text"].as_str() {
                        if !text.is_empty() {
                            text.push('\n');
                        }
                        text.push_str(t);
                    }
                }
            }
        }

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyOutput);
        }

        Ok(GenerationResponse { text, usage })
    }

    async fn send(&self, body: Value) -> Result<Value, GenerationError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(GenerationError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(format!("failed to parse response: {}", e)))
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn complete(&self, request: GenerationRequest) -> Result<GenerationResponse, GenerationError> {
        let body = self.build_body(&request);
        let response = self.send(body).await?;
        self.parse_response(response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn is_ready(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl std::fmt::Debug for HttpGenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGenerationClient")
            .field("endpoint", &self.config.endpoint)
            .field("model", &self.config.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> HttpGenerationClient {
        HttpGenerationClient::with_api_key("test-key".to_string(), HttpClientConfig::default()).unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = HttpClientConfig::default();
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(!config.model.is_empty());
    }

    #[test]
    fn test_config_with_model() {
        let config = HttpClientConfig::with_model("claude-haiku-3-5");
        assert_eq!(config.model, "claude-haiku-3-5");
    }

    #[test]
    fn test_build_body() {
        let client = test_client();
        let request = GenerationRequest::new("You draft posts.", "current draft: none").with_max_tokens(512);
        let body = client.build_body(&request);

        assert_eq!(body["system"], "You draft posts.");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "current draft: none");
    }

    #[test]
    fn test_build_body_default_max_tokens() {
        let client = test_client();
        let body = client.build_body(&GenerationRequest::new("i", "x"));
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_parse_response_joins_text_blocks() {
        let client = test_client();
        let body = json!({
            "content": [
                { "type": "text", "text": "first block" },
                { "type": "text", "text": "second block" }
            ],
            "usage": { "input_tokens": 10, "output_tokens": 20 }
        });

        let response = client.parse_response(body).unwrap();
        assert_eq!(response.text, "first block\nsecond block");
        assert_eq!(response.usage.input_tokens, 10);
        assert_eq!(response.usage.output_tokens, 20);
        assert_eq!(client.total_usage().total(), 30);
    }

    #[test]
    fn test_parse_response_empty_is_error() {
        let client = test_client();
        let body = json!({ "content": [], "usage": { "input_tokens": 5, "output_tokens": 0 } });
        let err = client.parse_response(body).unwrap_err();
        assert!(matches!(err, GenerationError::EmptyOutput));
    }

    #[test]
    fn test_parse_response_whitespace_only_is_error() {
        let client = test_client();
        let body = json!({ "content": [{ "type": "text", "text": "   \n " }] });
        assert!(matches!(client.parse_response(body).unwrap_err(), GenerationError::EmptyOutput));
    }

    #[test]
    fn test_is_ready_requires_key() {
        let client = test_client();
        assert!(client.is_ready());

        let keyless =
            HttpGenerationClient::with_api_key(String::new(), HttpClientConfig::default()).unwrap();
        assert!(!keyless.is_ready());
    }
}
