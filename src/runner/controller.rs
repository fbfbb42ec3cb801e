//! Loop controller - drives the refine-review cycle.
//!
//! Each cycle runs Generator → Reviewer → escalation check against session
//! state the controller exclusively owns. The loop stops on a pass verdict,
//! an external approval, an exhausted iteration budget, or a generation
//! failure; the stop reason is returned explicitly with the final artifact.

use std::sync::Arc;

use crate::domain::{LoopReport, StopReason, Verdict};
use crate::error::{RedraftError, Result};
use crate::generate::Generator;
use crate::hooks::HookChain;
use crate::review::Reviewer;
use crate::session::SessionState;

/// Configuration for the loop controller.
#[derive(Debug, Clone)]
pub struct RefineConfig {
    /// Maximum generator/reviewer cycles before giving up
    pub max_iterations: u32,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            max_iterations: crate::config::DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl RefineConfig {
    /// Create a config with an explicit iteration budget.
    pub fn new(max_iterations: u32) -> Self {
        Self { max_iterations }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(RedraftError::InvalidState("max_iterations must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Drives a single refine-review loop to completion.
///
/// Execution is strictly sequential within a cycle: the generator completes
/// before the reviewer starts, and the reviewer completes before the
/// escalation check runs. State is owned by this run; no other actor mutates
/// it concurrently.
pub struct LoopController<G, R>
where
    G: Generator,
    R: Reviewer,
{
    generator: Arc<G>,
    reviewer: Arc<R>,
    hooks: HookChain,
    config: RefineConfig,
}

impl<G, R> LoopController<G, R>
where
    G: Generator,
    R: Reviewer,
{
    /// Create a controller with the default configuration and no hooks.
    pub fn new(generator: Arc<G>, reviewer: Arc<R>) -> Self {
        Self {
            generator,
            reviewer,
            hooks: HookChain::new(),
            config: RefineConfig::default(),
        }
    }

    /// Set the loop configuration.
    pub fn with_config(mut self, config: RefineConfig) -> Self {
        self.config = config;
        self
    }

    /// Install an interceptor chain.
    pub fn with_hooks(mut self, hooks: HookChain) -> Self {
        self.hooks = hooks;
        self
    }

    /// Run the loop until a terminal verdict or the iteration budget.
    ///
    /// The budget binds the number of cycles: a reviewer that always fails
    /// terminates with `BudgetExhausted` after exactly `max_iterations`
    /// generator/reviewer cycles. On a generation failure, the last
    /// successfully generated artifact is preserved in the report and the
    /// error is surfaced separately.
    pub async fn run(&self, state: &mut SessionState) -> Result<LoopReport> {
        self.config.validate()?;

        let mut cycles: u32 = 0;
        loop {
            // 1. Generate (hooks may supply the artifact instead)
            let first = !state.has_artifact();
            let draft = match self.hooks.before_generate(state) {
                Some(artifact) => Ok(artifact),
                None => {
                    self.generator
                        .generate(&state.artifact, &state.feedback, first)
                        .await
                }
            };

            let draft = match draft {
                Ok(d) if !d.trim().is_empty() => d,
                Ok(_) => {
                    return Ok(self.halt(state, cycles, "generation returned empty output".to_string()));
                }
                Err(e) => {
                    return Ok(self.halt(state, cycles, e.to_string()));
                }
            };

            cycles += 1;
            state.set_artifact(draft);
            self.hooks.after_generate(state);

            // 2. Review (hooks may supply the verdict instead)
            let verdict = match self.hooks.before_review(state) {
                Some(v) => v,
                None => self.reviewer.review(&state.artifact).await?,
            };
            state.set_verdict(verdict.clone());
            self.hooks.after_review(state);

            log::debug!("session {}: cycle {} -> {}", state.id, cycles, state.verdict);

            // 3. Escalation check
            if verdict.signals_stop() {
                let reason = match verdict {
                    Verdict::Approved => StopReason::ExternalApproval,
                    _ => StopReason::Converged,
                };
                log::info!("session {}: stopped after {} cycle(s): {}", state.id, cycles, reason);
                return Ok(self.report(state, reason, cycles, None));
            }

            // 4. Iteration budget
            if state.iteration_count + 1 >= self.config.max_iterations {
                log::info!(
                    "session {}: iteration budget of {} exhausted",
                    state.id,
                    self.config.max_iterations
                );
                return Ok(self.report(state, StopReason::BudgetExhausted, cycles, None));
            }

            state.iteration_count += 1;
        }
    }

    /// Stop on a generation failure: record the error verdict, keep the last
    /// good artifact, surface the message in the report.
    fn halt(&self, state: &mut SessionState, cycles: u32, message: String) -> LoopReport {
        log::error!("session {}: generation failed: {}", state.id, message);
        state.set_verdict(Verdict::Error(message.clone()));
        self.report(state, StopReason::Errored, cycles, Some(message))
    }

    fn report(
        &self,
        state: &SessionState,
        reason: StopReason,
        cycles: u32,
        error: Option<String>,
    ) -> LoopReport {
        LoopReport {
            artifact: state.artifact.clone(),
            reason,
            cycles,
            verdict: state.verdict.clone(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::ScriptedGenerator;
    use crate::hooks::Hook;
    use crate::review::{AcceptanceCriteria, RuleReviewer};
    use async_trait::async_trait;

    /// Reviewer that always fails with the same reason.
    struct AlwaysFail;

    #[async_trait]
    impl Reviewer for AlwaysFail {
        async fn review(&self, _artifact: &str) -> Result<Verdict> {
            Ok(Verdict::Fail("not good enough".to_string()))
        }
    }

    /// Reviewer that fails N times, then passes.
    struct PassAfter {
        failures: std::sync::atomic::AtomicU32,
        pass_after: u32,
    }

    impl PassAfter {
        fn new(pass_after: u32) -> Self {
            Self {
                failures: std::sync::atomic::AtomicU32::new(0),
                pass_after,
            }
        }
    }

    #[async_trait]
    impl Reviewer for PassAfter {
        async fn review(&self, _artifact: &str) -> Result<Verdict> {
            let seen = self.failures.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if seen >= self.pass_after {
                Ok(Verdict::Pass)
            } else {
                Ok(Verdict::Fail(format!("revision {} requested", seen + 1)))
            }
        }
    }

    /// Generator that always errors.
    struct BrokenGenerator;

    #[async_trait]
    impl Generator for BrokenGenerator {
        async fn generate(&self, _current: &str, _feedback: &str, _first: bool) -> Result<String> {
            Err(crate::llm::GenerationError::Api {
                status: 500,
                message: "service unavailable".to_string(),
            }
            .into())
        }
    }

    #[test]
    fn test_refine_config_validation() {
        assert!(RefineConfig::new(1).validate().is_ok());
        assert!(RefineConfig::new(0).validate().is_err());
        assert_eq!(RefineConfig::default().max_iterations, crate::config::DEFAULT_MAX_ITERATIONS);
    }

    #[tokio::test]
    async fn test_converges_on_first_pass() {
        let generator = Arc::new(ScriptedGenerator::new(vec!["a fine draft"]));
        let reviewer = Arc::new(PassAfter::new(0));
        let controller = LoopController::new(generator, reviewer);

        let mut state = SessionState::new();
        let report = controller.run(&mut state).await.unwrap();

        assert_eq!(report.reason, StopReason::Converged);
        assert_eq!(report.cycles, 1);
        assert_eq!(report.artifact, "a fine draft");
        assert_eq!(report.verdict, Verdict::Pass);
        assert!(report.error.is_none());
        assert_eq!(state.iteration_count, 0);
    }

    #[tokio::test]
    async fn test_budget_exhausted_after_exact_cycles() {
        // An always-failing reviewer with a budget of 3 runs exactly 3
        // generator/reviewer cycles
        let generator = Arc::new(ScriptedGenerator::new(vec!["v1", "v2", "v3", "v4", "v5"]));
        let reviewer = Arc::new(AlwaysFail);
        let controller =
            LoopController::new(generator.clone(), reviewer).with_config(RefineConfig::new(3));

        let mut state = SessionState::new();
        let report = controller.run(&mut state).await.unwrap();

        assert_eq!(report.reason, StopReason::BudgetExhausted);
        assert_eq!(report.cycles, 3);
        assert_eq!(generator.calls().len(), 3);
        assert_eq!(report.artifact, "v3");
        assert!(matches!(report.verdict, Verdict::Fail(_)));
    }

    #[tokio::test]
    async fn test_feedback_threads_into_next_generation() {
        let generator = Arc::new(ScriptedGenerator::new(vec!["v1", "v2"]));
        let reviewer = Arc::new(PassAfter::new(1));
        let controller = LoopController::new(generator.clone(), reviewer);

        let mut state = SessionState::new();
        let report = controller.run(&mut state).await.unwrap();

        assert_eq!(report.reason, StopReason::Converged);
        assert_eq!(report.cycles, 2);

        let calls = generator.calls();
        assert!(calls[0].first);
        assert!(calls[0].feedback.is_empty());
        assert!(!calls[1].first);
        assert_eq!(calls[1].current, "v1");
        assert_eq!(calls[1].feedback, "revision 1 requested");
    }

    #[tokio::test]
    async fn test_generation_error_halts_and_preserves_artifact() {
        // First cycle generates fine and fails review; second generation
        // errors. The report must carry v1 and the error message.
        struct FailSecond {
            calls: std::sync::atomic::AtomicU32,
        }

        #[async_trait]
        impl Generator for FailSecond {
            async fn generate(&self, _current: &str, _feedback: &str, _first: bool) -> Result<String> {
                if self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                    Ok("v1".to_string())
                } else {
                    Err(crate::llm::GenerationError::EmptyOutput.into())
                }
            }
        }

        let generator = Arc::new(FailSecond {
            calls: std::sync::atomic::AtomicU32::new(0),
        });
        let reviewer = Arc::new(AlwaysFail);
        let controller = LoopController::new(generator, reviewer).with_config(RefineConfig::new(5));

        let mut state = SessionState::new();
        let report = controller.run(&mut state).await.unwrap();

        assert_eq!(report.reason, StopReason::Errored);
        assert_eq!(report.cycles, 1);
        assert_eq!(report.artifact, "v1");
        assert!(matches!(report.verdict, Verdict::Error(_)));
        assert!(report.error.as_deref().unwrap().contains("empty output"));
    }

    #[tokio::test]
    async fn test_immediate_generation_failure() {
        let controller =
            LoopController::new(Arc::new(BrokenGenerator), Arc::new(AlwaysFail));

        let mut state = SessionState::new();
        let report = controller.run(&mut state).await.unwrap();

        assert_eq!(report.reason, StopReason::Errored);
        assert_eq!(report.cycles, 0);
        assert!(report.artifact.is_empty());
        assert!(report.error.as_deref().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn test_empty_draft_is_a_generation_failure() {
        let generator = Arc::new(ScriptedGenerator::new(vec!["   "]));
        let controller = LoopController::new(generator, Arc::new(AlwaysFail));

        let mut state = SessionState::new();
        let report = controller.run(&mut state).await.unwrap();

        assert_eq!(report.reason, StopReason::Errored);
        assert!(report.error.as_deref().unwrap().contains("empty output"));
    }

    #[tokio::test]
    async fn test_external_approval_stops_with_artifact_unchanged() {
        // An approving review source ends the loop with the artifact
        // exactly as the generator last produced it
        struct ApproveImmediately;

        #[async_trait]
        impl Reviewer for ApproveImmediately {
            async fn review(&self, _artifact: &str) -> Result<Verdict> {
                Ok(Verdict::Approved)
            }
        }

        let generator = Arc::new(ScriptedGenerator::new(vec!["operator-reviewed draft"]));
        let controller = LoopController::new(generator, Arc::new(ApproveImmediately));

        let mut state = SessionState::new();
        let report = controller.run(&mut state).await.unwrap();

        assert_eq!(report.reason, StopReason::ExternalApproval);
        assert_eq!(report.artifact, "operator-reviewed draft");
        assert_eq!(report.verdict, Verdict::Approved);
        assert_eq!(report.cycles, 1);
    }

    #[tokio::test]
    async fn test_rule_reviewer_end_to_end_convergence() {
        // Drafts shrink into bounds on the second try
        let generator = Arc::new(ScriptedGenerator::new(vec!["tiny", "a draft that is long enough"]));
        let reviewer = Arc::new(RuleReviewer::new(AcceptanceCriteria::with_bounds(10, 100)).unwrap());
        let controller = LoopController::new(generator, reviewer).with_config(RefineConfig::new(5));

        let mut state = SessionState::new();
        let report = controller.run(&mut state).await.unwrap();

        assert_eq!(report.reason, StopReason::Converged);
        assert_eq!(report.cycles, 2);
        assert_eq!(report.artifact, "a draft that is long enough");
    }

    #[tokio::test]
    async fn test_before_generate_hook_short_circuits() {
        struct SeedDraft;

        impl Hook for SeedDraft {
            fn before_generate(&self, _state: &mut SessionState) -> Option<String> {
                Some("seeded artifact long enough to pass".to_string())
            }
        }

        // The scripted generator would error on an empty script; the hook
        // means it is never consulted.
        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let reviewer = Arc::new(RuleReviewer::new(AcceptanceCriteria::with_bounds(5, 100)).unwrap());
        let controller = LoopController::new(generator.clone(), reviewer)
            .with_hooks(HookChain::new().with_hook(SeedDraft));

        let mut state = SessionState::new();
        let report = controller.run(&mut state).await.unwrap();

        assert_eq!(report.reason, StopReason::Converged);
        assert_eq!(report.artifact, "seeded artifact long enough to pass");
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_before_review_hook_short_circuits() {
        struct InstantApproval;

        impl Hook for InstantApproval {
            fn before_review(&self, _state: &mut SessionState) -> Option<Verdict> {
                Some(Verdict::Approved)
            }
        }

        let generator = Arc::new(ScriptedGenerator::new(vec!["draft"]));
        let controller = LoopController::new(generator, Arc::new(AlwaysFail))
            .with_hooks(HookChain::new().with_hook(InstantApproval));

        let mut state = SessionState::new();
        let report = controller.run(&mut state).await.unwrap();
        assert_eq!(report.reason, StopReason::ExternalApproval);
    }

    #[tokio::test]
    async fn test_zero_budget_rejected() {
        let generator = Arc::new(ScriptedGenerator::new(vec!["draft"]));
        let controller =
            LoopController::new(generator, Arc::new(AlwaysFail)).with_config(RefineConfig::new(0));

        let mut state = SessionState::new();
        assert!(controller.run(&mut state).await.is_err());
    }

    #[tokio::test]
    async fn test_iteration_count_tracks_completed_cycles() {
        let generator = Arc::new(ScriptedGenerator::new(vec!["v1", "v2", "v3"]));
        let reviewer = Arc::new(AlwaysFail);
        let controller =
            LoopController::new(generator, reviewer).with_config(RefineConfig::new(3));

        let mut state = SessionState::new();
        controller.run(&mut state).await.unwrap();

        // Two non-terminal cycles incremented the count; the terminating
        // cycle did not
        assert_eq!(state.iteration_count, 2);
    }
}
