//! Reviewer trait and the deterministic rule-based reviewer.

use async_trait::async_trait;

use crate::domain::Verdict;
use crate::error::Result;
use crate::review::criteria::{AcceptanceCriteria, LengthCheck};

/// Trait for review sources that judge the current artifact.
///
/// A reviewer only produces a verdict; it never mutates the artifact. Review
/// of an unchanged artifact is expected to be idempotent.
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Evaluate the artifact and return a verdict.
    async fn review(&self, artifact: &str) -> Result<Verdict>;

    /// Get a description of what this reviewer checks
    fn description(&self) -> &str {
        "reviewer"
    }
}

/// Deterministic reviewer checking length bounds and content markers.
///
/// Length is checked first; content markers are only evaluated once length is
/// acceptable, so a draft that will be regenerated for length alone never
/// receives marker feedback.
pub struct RuleReviewer {
    criteria: AcceptanceCriteria,
}

impl RuleReviewer {
    /// Create a reviewer over validated criteria.
    pub fn new(criteria: AcceptanceCriteria) -> Result<Self> {
        criteria.validate()?;
        Ok(Self { criteria })
    }

    /// The criteria this reviewer applies.
    pub fn criteria(&self) -> &AcceptanceCriteria {
        &self.criteria
    }

    fn review_sync(&self, artifact: &str) -> Verdict {
        match self.criteria.check_length(artifact) {
            LengthCheck::TooShort { chars_needed, .. } => {
                return Verdict::Fail(format!("too short, need {} more characters", chars_needed));
            }
            LengthCheck::TooLong { chars_to_remove, .. } => {
                return Verdict::Fail(format!("too long, remove {} characters", chars_to_remove));
            }
            LengthCheck::Ok { .. } => {}
        }

        let mut problems = Vec::new();
        for marker in &self.criteria.required_markers {
            if !artifact.contains(marker.as_str()) {
                problems.push(format!("missing required marker \"{}\"", marker));
            }
        }
        for marker in &self.criteria.forbidden_markers {
            if artifact.contains(marker.as_str()) {
                problems.push(format!("contains forbidden marker \"{}\"", marker));
            }
        }

        if problems.is_empty() {
            Verdict::Pass
        } else {
            Verdict::Fail(problems.join("; "))
        }
    }
}

#[async_trait]
impl Reviewer for RuleReviewer {
    async fn review(&self, artifact: &str) -> Result<Verdict> {
        Ok(self.review_sync(artifact))
    }

    fn description(&self) -> &str {
        "rule reviewer"
    }
}
