//! Session state threaded through every step of a loop run.
//!
//! The loop fields (artifact, verdict, feedback, iteration count) are typed
//! struct fields rather than loose map lookups, so a malformed key can never
//! surface as a silent miss mid-run. Auxiliary data (metric probe output,
//! hook scratch values) lives in a key-value map with explicit defaults for
//! absent keys.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Verdict;
use crate::id::{generate_session_id, now_ms};

/// Mutable state for one refine-loop session.
///
/// Owned exclusively by the loop controller for the duration of a run; steps
/// read and write through it and never retain private copies across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Unique session identifier
    pub id: String,

    /// The text being iteratively produced
    pub artifact: String,

    /// Outcome of the most recent review pass
    pub verdict: Verdict,

    /// Revision feedback for the next generator invocation; empty when no
    /// revision was requested
    pub feedback: String,

    /// Completed non-terminal cycles so far
    pub iteration_count: u32,

    /// Auxiliary step data keyed by name (probe reports, hook scratch)
    #[serde(default)]
    values: HashMap<String, Value>,

    pub created_at: i64,
    pub updated_at: i64,
}

impl SessionState {
    /// Create a fresh session with an empty artifact and a pending verdict.
    pub fn new() -> Self {
        let now = now_ms();
        Self {
            id: generate_session_id(),
            artifact: String::new(),
            verdict: Verdict::Pending,
            feedback: String::new(),
            iteration_count: 0,
            values: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a session with an explicit id (used when reloading from a store).
    pub fn with_id(id: impl Into<String>) -> Self {
        let mut state = Self::new();
        state.id = id.into();
        state
    }

    /// Look up an auxiliary value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Look up an auxiliary value, falling back to a caller-supplied default.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.values.get(key).unwrap_or(default)
    }

    /// Set an auxiliary value, overwriting in place. The write is visible to
    /// all subsequent steps in the same loop run.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
        self.touch();
    }

    /// Auxiliary keys currently present, unordered.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// True once the first generator invocation has produced an artifact.
    pub fn has_artifact(&self) -> bool {
        !self.artifact.is_empty()
    }

    /// Record a freshly generated draft.
    pub fn set_artifact(&mut self, artifact: impl Into<String>) {
        self.artifact = artifact.into();
        self.touch();
    }

    /// Record a review verdict; feedback mirrors the Fail reason and clears
    /// on any other variant.
    pub fn set_verdict(&mut self, verdict: Verdict) {
        self.feedback = verdict.feedback().to_string();
        self.verdict = verdict;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = now_ms();
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
