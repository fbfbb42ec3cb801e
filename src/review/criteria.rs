//! Acceptance criteria for the rule-based reviewer.
//!
//! Loaded once before a loop starts and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{RedraftError, Result};

fn default_min_length() -> usize {
    1000
}

fn default_max_length() -> usize {
    1500
}

/// Fixed rule set the reviewer checks an artifact against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptanceCriteria {
    /// Minimum artifact length in characters
    pub min_length: usize,
    /// Maximum artifact length in characters
    pub max_length: usize,
    /// Substrings that must appear in the artifact
    pub required_markers: Vec<String>,
    /// Substrings that must not appear in the artifact
    pub forbidden_markers: Vec<String>,
}

impl Default for AcceptanceCriteria {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            max_length: default_max_length(),
            required_markers: Vec::new(),
            forbidden_markers: Vec::new(),
        }
    }
}

impl AcceptanceCriteria {
    /// Criteria with explicit length bounds and no marker requirements.
    pub fn with_bounds(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length,
            ..Default::default()
        }
    }

    /// Criteria for the social-media post workload: 1000-1500 characters,
    /// must mention the tutorial author, no hashtags.
    pub fn social_post() -> Self {
        Self {
            min_length: 1000,
            max_length: 1500,
            required_markers: vec!["@aiwithbrandon".to_string()],
            forbidden_markers: vec!["#".to_string()],
        }
    }

    /// Add a required marker (builder pattern).
    pub fn with_required_marker(mut self, marker: impl Into<String>) -> Self {
        self.required_markers.push(marker.into());
        self
    }

    /// Add a forbidden marker.
    pub fn with_forbidden_marker(mut self, marker: impl Into<String>) -> Self {
        self.forbidden_markers.push(marker.into());
        self
    }

    /// Validate the criteria.
    pub fn validate(&self) -> Result<()> {
        if self.min_length > self.max_length {
            return Err(RedraftError::InvalidState(format!(
                "min_length ({}) exceeds max_length ({})",
                self.min_length, self.max_length
            )));
        }
        Ok(())
    }

    /// Length check over an artifact, counting characters the way the review
    /// feedback reports them (Unicode scalar values, not bytes).
    pub fn check_length(&self, artifact: &str) -> LengthCheck {
        let count = artifact.chars().count();
        if count < self.min_length {
            LengthCheck::TooShort {
                char_count: count,
                chars_needed: self.min_length - count,
            }
        } else if count > self.max_length {
            LengthCheck::TooLong {
                char_count: count,
                chars_to_remove: count - self.max_length,
            }
        } else {
            LengthCheck::Ok { char_count: count }
        }
    }
}

/// Result of the length check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthCheck {
    /// Within bounds
    Ok { char_count: usize },
    /// Below the minimum
    TooShort { char_count: usize, chars_needed: usize },
    /// Above the maximum
    TooLong { char_count: usize, chars_to_remove: usize },
}

impl LengthCheck {
    pub fn passed(&self) -> bool {
        matches!(self, LengthCheck::Ok { .. })
    }
}
