//! Generation client trait and request/response types.
//!
//! The text-generation service is an opaque external collaborator: the crate
//! sends an instruction plus a state snapshot and gets text back. Everything
//! else about the service (latency, refusals, malformed output) shows up as
//! a `GenerationError`.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Stateless generation client. Each call is independent; context travels in
/// the request, never in the client.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Single completion request, blocking until the service responds.
    async fn complete(&self, request: GenerationRequest) -> Result<GenerationResponse, GenerationError>;

    /// Model identifier this client talks to.
    fn model(&self) -> &str;

    /// Whether the client is configured well enough to attempt a call.
    fn is_ready(&self) -> bool;
}

/// Everything needed for one generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Instruction text (role and task description)
    pub instruction: String,
    /// Snapshot of the relevant session state, rendered as the user turn
    pub input: String,
    /// Max tokens for the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    /// Create a request with an instruction and input snapshot.
    pub fn new(instruction: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            input: input.into(),
            max_tokens: None,
        }
    }

    /// Set max tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from a generation call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Generated text
    pub text: String,
    /// Token usage for cost tracking
    pub usage: TokenUsage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self { input_tokens, output_tokens }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    /// Accumulate usage from another call.
    pub fn add(&mut self, other: &TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Errors that can occur during generation calls.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Generation returned empty output")]
    EmptyOutput,

    #[error("Missing API key: environment variable {env_var} not set")]
    MissingApiKey { env_var: String },
}

impl GenerationError {
    /// Whether a retry could plausibly succeed. The loop controller does not
    /// retry on its own; callers with a retry policy consult this.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::RateLimited { .. } => true,
            GenerationError::Api { status, .. } => *status >= 500,
            GenerationError::Network(_) => true,
            GenerationError::InvalidResponse(_) => false,
            GenerationError::EmptyOutput => false,
            GenerationError::MissingApiKey { .. } => false,
        }
    }
}

/// Scripted client for tests and offline demos. Pops one canned reply per
/// call; an exhausted script is an invalid-response error.
pub struct MockGenerationClient {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerationClient {
    /// Create a client that replies with the given texts in order.
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.to_string())).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a client from explicit per-call results, errors included.
    pub fn with_results(results: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            replies: Mutex::new(results.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in call order.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn complete(&self, request: GenerationRequest) -> Result<GenerationResponse, GenerationError> {
        self.calls.lock().expect("mock call log poisoned").push(request);
        let reply = self
            .replies
            .lock()
            .expect("mock reply queue poisoned")
            .pop_front()
            .ok_or_else(|| GenerationError::InvalidResponse("mock script exhausted".to_string()))?;
        reply.map(|text| GenerationResponse {
            usage: TokenUsage::new(0, text.len() as u64 / 4),
            text,
        })
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new("You draft posts.", "feedback: none").with_max_tokens(1024);
        assert_eq!(request.instruction, "You draft posts.");
        assert_eq!(request.input, "feedback: none");
        assert_eq!(request.max_tokens, Some(1024));
    }

    #[test]
    fn test_token_usage_total_and_add() {
        let mut usage = TokenUsage::new(100, 50);
        assert_eq!(usage.total(), 150);
        usage.add(&TokenUsage::new(10, 5));
        assert_eq!(usage.input_tokens, 110);
        assert_eq!(usage.output_tokens, 55);
    }

    #[test]
    fn test_error_is_retryable() {
        assert!(GenerationError::RateLimited { retry_after: Duration::from_secs(60) }.is_retryable());
        assert!(GenerationError::Api { status: 503, message: "overloaded".into() }.is_retryable());
        assert!(!GenerationError::Api { status: 400, message: "bad request".into() }.is_retryable());
        assert!(!GenerationError::EmptyOutput.is_retryable());
        assert!(!GenerationError::MissingApiKey { env_var: "REDRAFT_API_KEY".into() }.is_retryable());
    }

    #[tokio::test]
    async fn test_mock_client_replies_in_order() {
        let client = MockGenerationClient::new(vec!["first", "second"]);

        let r1 = client.complete(GenerationRequest::new("i", "a")).await.unwrap();
        let r2 = client.complete(GenerationRequest::new("i", "b")).await.unwrap();
        assert_eq!(r1.text, "first");
        assert_eq!(r2.text, "second");

        // Script exhausted
        let err = client.complete(GenerationRequest::new("i", "c")).await.unwrap_err();
        assert!(matches!(err, GenerationError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_mock_client_records_calls() {
        let client = MockGenerationClient::new(vec!["draft"]);
        client.complete(GenerationRequest::new("instruction", "snapshot")).await.unwrap();

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].instruction, "instruction");
        assert_eq!(calls[0].input, "snapshot");
    }

    #[tokio::test]
    async fn test_mock_client_scripted_error() {
        let client = MockGenerationClient::with_results(vec![Err(GenerationError::EmptyOutput)]);
        let err = client.complete(GenerationRequest::new("i", "x")).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyOutput));
    }

    #[test]
    fn test_mock_client_metadata() {
        let client = MockGenerationClient::new(vec![]);
        assert_eq!(client.model(), "mock-model");
        assert!(client.is_ready());
    }
}
