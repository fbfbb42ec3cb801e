//! Loop termination types.
//!
//! The stop reason is an explicit return value from the controller, not a
//! flag mutated on a shared record, so callers always learn why the loop
//! ended together with the artifact it ended on.

use serde::{Deserialize, Serialize};

use crate::domain::Verdict;

/// Why the refine loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The reviewer returned Pass
    Converged,
    /// An external approval source returned Approved
    ExternalApproval,
    /// The iteration budget ran out before the criteria were met
    BudgetExhausted,
    /// The generation step failed; the run could not continue
    Errored,
}

impl StopReason {
    /// True when the terminal artifact met the acceptance criteria or was
    /// explicitly approved.
    pub fn is_accepted(&self) -> bool {
        matches!(self, StopReason::Converged | StopReason::ExternalApproval)
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StopReason::Converged => "converged",
            StopReason::ExternalApproval => "external approval",
            StopReason::BudgetExhausted => "budget exhausted",
            StopReason::Errored => "errored",
        };
        write!(f, "{}", label)
    }
}

/// Final report from one loop run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopReport {
    /// The artifact as of the last successful generator invocation
    pub artifact: String,
    /// Why the loop stopped
    pub reason: StopReason,
    /// Number of generator/reviewer cycles executed
    pub cycles: u32,
    /// The terminating verdict
    pub verdict: Verdict,
    /// Error message when reason is Errored; never silently lost
    pub error: Option<String>,
}
