//! Generator trait and the scripted implementation.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::llm::GenerationError;

/// Trait for artifact producers.
///
/// On the first iteration (`first` true, `current` empty) the generator
/// produces a new artifact from its task description. On later iterations it
/// revises `current` by applying `feedback` literally, without unrequested
/// changes, and returns the artifact text only. The loop controller writes
/// the returned string into session state.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce or revise the artifact.
    async fn generate(&self, current: &str, feedback: &str, first: bool) -> Result<String>;

    /// Get a description of what this generator produces
    fn description(&self) -> &str {
        "generator"
    }
}

/// Generator replaying canned drafts, for tests and offline demos.
pub struct ScriptedGenerator {
    drafts: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<ScriptedCall>>,
}

/// One recorded call to a [`ScriptedGenerator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedCall {
    pub current: String,
    pub feedback: String,
    pub first: bool,
}

impl ScriptedGenerator {
    /// Create a generator that returns the given drafts in order. When the
    /// script runs out, the last draft repeats.
    pub fn new(drafts: Vec<&str>) -> Self {
        Self {
            drafts: Mutex::new(drafts.into_iter().map(String::from).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<ScriptedCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, current: &str, feedback: &str, first: bool) -> Result<String> {
        self.calls.lock().expect("call log poisoned").push(ScriptedCall {
            current: current.to_string(),
            feedback: feedback.to_string(),
            first,
        });

        let mut drafts = self.drafts.lock().expect("draft queue poisoned");
        let draft = if drafts.len() > 1 {
            drafts.pop_front()
        } else {
            drafts.front().cloned()
        };
        draft.ok_or_else(|| GenerationError::EmptyOutput.into())
    }

    fn description(&self) -> &str {
        "scripted generator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_generator_replays_in_order() {
        let generator = ScriptedGenerator::new(vec!["v1", "v2", "v3"]);
        assert_eq!(generator.generate("", "", true).await.unwrap(), "v1");
        assert_eq!(generator.generate("v1", "longer", false).await.unwrap(), "v2");
        assert_eq!(generator.generate("v2", "shorter", false).await.unwrap(), "v3");
    }

    #[tokio::test]
    async fn test_scripted_generator_repeats_last_draft() {
        let generator = ScriptedGenerator::new(vec!["only"]);
        assert_eq!(generator.generate("", "", true).await.unwrap(), "only");
        assert_eq!(generator.generate("only", "again", false).await.unwrap(), "only");
    }

    #[tokio::test]
    async fn test_scripted_generator_empty_script_errors() {
        let generator = ScriptedGenerator::new(vec![]);
        assert!(generator.generate("", "", true).await.is_err());
    }

    #[tokio::test]
    async fn test_scripted_generator_records_calls() {
        let generator = ScriptedGenerator::new(vec!["v1", "v2"]);
        generator.generate("", "", true).await.unwrap();
        generator.generate("v1", "fix the ending", false).await.unwrap();

        let calls = generator.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].first);
        assert_eq!(calls[1].current, "v1");
        assert_eq!(calls[1].feedback, "fix the ending");
        assert!(!calls[1].first);
    }
}
