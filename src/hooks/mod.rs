//! Interceptor hooks around the generate and review steps.
//!
//! Hooks form an ordered chain. A `before_*` hook may short-circuit its step
//! by returning a replacement value; returning `None` passes through to the
//! next hook and finally to the real step. `after_*` hooks observe every
//! cycle and may write auxiliary state.

use crate::domain::Verdict;
use crate::session::SessionState;

/// One interceptor in the chain. All methods default to pass-through.
pub trait Hook: Send + Sync {
    /// Runs before the generator. Returning `Some(artifact)` skips generation
    /// and uses the returned artifact for this cycle.
    fn before_generate(&self, _state: &mut SessionState) -> Option<String> {
        None
    }

    /// Runs after the artifact for this cycle is in state.
    fn after_generate(&self, _state: &mut SessionState) {}

    /// Runs before the reviewer. Returning `Some(verdict)` skips review and
    /// uses the returned verdict for this cycle.
    fn before_review(&self, _state: &mut SessionState) -> Option<Verdict> {
        None
    }

    /// Runs after the verdict for this cycle is in state.
    fn after_review(&self, _state: &mut SessionState) {}

    /// Get a description of what this hook does
    fn description(&self) -> &str {
        "hook"
    }
}

/// An ordered chain of hooks.
///
/// `before_*` walks the chain in order and stops at the first hook that
/// returns a replacement; `after_*` always visits every hook in order.
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Box<dyn Hook>>,
}

impl HookChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hook to the chain (builder pattern).
    pub fn with_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Add a boxed hook to the chain.
    pub fn add_boxed(mut self, hook: Box<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Number of hooks in the chain.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Check if the chain has no hooks.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn before_generate(&self, state: &mut SessionState) -> Option<String> {
        self.hooks.iter().find_map(|h| h.before_generate(state))
    }

    pub fn after_generate(&self, state: &mut SessionState) {
        for hook in &self.hooks {
            hook.after_generate(state);
        }
    }

    pub fn before_review(&self, state: &mut SessionState) -> Option<Verdict> {
        self.hooks.iter().find_map(|h| h.before_review(state))
    }

    pub fn after_review(&self, state: &mut SessionState) {
        for hook in &self.hooks {
            hook.after_review(state);
        }
    }
}

/// Hook logging each step transition at info level.
pub struct LoggingHook;

impl Hook for LoggingHook {
    fn after_generate(&self, state: &mut SessionState) {
        log::info!(
            "session {}: cycle {} generated {} chars",
            state.id,
            state.iteration_count + 1,
            state.artifact.chars().count()
        );
    }

    fn after_review(&self, state: &mut SessionState) {
        log::info!("session {}: cycle {} verdict {}", state.id, state.iteration_count + 1, state.verdict);
    }

    fn description(&self) -> &str {
        "logging hook"
    }
}
