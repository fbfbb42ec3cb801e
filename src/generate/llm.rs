//! LLM-backed generator.
//!
//! Builds a fresh request every iteration: the task description plus the
//! current draft and accumulated feedback travel in the request itself, never
//! in client-side conversation history.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::generate::generator::Generator;
use crate::llm::{GenerationClient, GenerationError, GenerationRequest};

const INITIAL_INSTRUCTION: &str = "You are a drafting assistant. Write a new draft for the task \
below. Return only the draft text, with no commentary, headers, or formatting markers.";

const REVISION_INSTRUCTION: &str = "You are a drafting assistant revising an existing draft. Apply \
the feedback precisely and literally. Do not make changes that were not requested and do not \
explain your edits. Return only the revised draft text.";

/// Generator backed by an external generation client.
pub struct LlmGenerator {
    client: Arc<dyn GenerationClient>,
    /// Fixed description of what to produce on the first iteration
    task: String,
    max_tokens: Option<u32>,
}

impl LlmGenerator {
    /// Create a generator for the given task.
    pub fn new(client: Arc<dyn GenerationClient>, task: impl Into<String>) -> Self {
        Self {
            client,
            task: task.into(),
            max_tokens: None,
        }
    }

    /// Cap response tokens per call.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// The task description used for initial drafts.
    pub fn task(&self) -> &str {
        &self.task
    }

    fn build_request(&self, current: &str, feedback: &str, first: bool) -> GenerationRequest {
        let (instruction, input) = if first {
            (INITIAL_INSTRUCTION, format!("## Task\n{}", self.task))
        } else {
            (
                REVISION_INSTRUCTION,
                format!(
                    "## Task\n{}\n\n## Current draft\n{}\n\n## Feedback to apply\n{}",
                    self.task, current, feedback
                ),
            )
        };

        let mut request = GenerationRequest::new(instruction, input);
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, current: &str, feedback: &str, first: bool) -> Result<String> {
        let request = self.build_request(current, feedback, first);
        log::debug!(
            "generation call: model={} first={} feedback_len={}",
            self.client.model(),
            first,
            feedback.chars().count()
        );

        let response = self.client.complete(request).await?;
        let draft = response.text.trim().to_string();
        if draft.is_empty() {
            return Err(GenerationError::EmptyOutput.into());
        }
        Ok(draft)
    }

    fn description(&self) -> &str {
        "llm generator"
    }
}
