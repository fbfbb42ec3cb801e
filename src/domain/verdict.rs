//! Review verdict type and the escalation predicate.
//!
//! A Verdict is the outcome of one review pass over the current artifact.
//! It is produced by a reviewer (rule-based or human) and consumed by the
//! loop controller's escalation check.

use serde::{Deserialize, Serialize};

/// Outcome of one review pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Verdict {
    /// No review has run yet (initial state of a fresh session)
    Pending,
    /// Artifact meets all acceptance criteria
    Pass,
    /// Artifact does not meet criteria; reason doubles as revision feedback
    Fail(String),
    /// An external approval source (human operator) accepted the artifact
    Approved,
    /// The generation step failed; the loop halts rather than iterating on
    /// unusable input
    Error(String),
}

impl Verdict {
    /// Escalation check: should the loop stop on this verdict?
    ///
    /// True iff the verdict is `Pass` or `Approved`. `Fail` and `Error`
    /// return false; the iteration budget and the generation-error halt are
    /// enforced by the loop controller, not this predicate.
    pub fn signals_stop(&self) -> bool {
        matches!(self, Verdict::Pass | Verdict::Approved)
    }

    /// The revision feedback carried by this verdict, empty unless `Fail`.
    pub fn feedback(&self) -> &str {
        match self {
            Verdict::Fail(reason) => reason,
            _ => "",
        }
    }

    /// Short status label, matching the serialized tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pending => "pending",
            Verdict::Pass => "pass",
            Verdict::Fail(_) => "fail",
            Verdict::Approved => "approved",
            Verdict::Error(_) => "error",
        }
    }
}

impl Default for Verdict {
    fn default() -> Self {
        Verdict::Pending
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Fail(reason) => write!(f, "fail: {}", reason),
            Verdict::Error(message) => write!(f, "error: {}", message),
            other => write!(f, "{}", other.as_str()),
        }
    }
}
