//! Human-in-the-loop review.
//!
//! The operator sees the current draft and either approves it or types
//! revision feedback. The prompt blocks for as long as the operator takes;
//! cancellation is an external interrupt, not a timeout.

use std::io::{BufRead, Write};
use std::sync::Arc;

use async_trait::async_trait;
use colored::Colorize;

use crate::domain::Verdict;
use crate::error::{RedraftError, Result};
use crate::review::reviewer::Reviewer;

/// Tokens accepted as approval, compared case-insensitively after trimming.
const APPROVAL_TOKENS: &[&str] = &["approve", "a"];

/// Operator reply to a feedback request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackReply {
    /// Operator accepted the artifact as-is
    Approved,
    /// Operator requested a revision; the text is applied verbatim
    Revise(String),
}

/// Blocking channel to a human operator.
pub trait FeedbackChannel: Send + Sync {
    /// Show the artifact and block until the operator replies.
    fn request_feedback(&self, artifact: &str) -> Result<FeedbackReply>;
}

/// Parse one line of operator input. Empty input means "ask again"; anything
/// that is not an approval token is revision feedback verbatim.
pub fn parse_reply(line: &str) -> Option<FeedbackReply> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if APPROVAL_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t)) {
        Some(FeedbackReply::Approved)
    } else {
        Some(FeedbackReply::Revise(trimmed.to_string()))
    }
}

/// Feedback channel over stdin/stdout.
pub struct StdinFeedback;

impl StdinFeedback {
    pub fn new() -> Self {
        Self
    }

    fn prompt_once(&self, artifact: &str) -> Result<Option<FeedbackReply>> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "\n{}", "--- current draft ---".cyan())?;
        writeln!(out, "{}", artifact)?;
        writeln!(out, "{}", "---------------------".cyan())?;
        write!(
            out,
            "{} ",
            "Type 'approve' (or 'a') to accept, or revision feedback:".yellow()
        )?;
        out.flush()?;

        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            // EOF: the operator is gone; never default to approval
            return Err(RedraftError::ExternalInput("feedback channel closed (EOF)".to_string()));
        }
        Ok(parse_reply(&line))
    }
}

impl Default for StdinFeedback {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackChannel for StdinFeedback {
    fn request_feedback(&self, artifact: &str) -> Result<FeedbackReply> {
        loop {
            match self.prompt_once(artifact)? {
                Some(reply) => return Ok(reply),
                None => {
                    println!("{}", "Empty input; please approve or give feedback.".red());
                }
            }
        }
    }
}

/// Reviewer sourcing verdicts from a human operator.
///
/// Approval becomes `Verdict::Approved`; revision feedback becomes
/// `Verdict::Fail` carrying the feedback verbatim, which drives the next
/// generator iteration.
pub struct HumanReviewer {
    channel: Arc<dyn FeedbackChannel>,
}

impl HumanReviewer {
    pub fn new(channel: Arc<dyn FeedbackChannel>) -> Self {
        Self { channel }
    }

    /// Convenience constructor over stdin.
    pub fn stdin() -> Self {
        Self::new(Arc::new(StdinFeedback::new()))
    }
}

#[async_trait]
impl Reviewer for HumanReviewer {
    async fn review(&self, artifact: &str) -> Result<Verdict> {
        let channel = Arc::clone(&self.channel);
        let artifact = artifact.to_string();
        // The channel blocks on operator input; keep it off the async workers.
        let reply = tokio::task::spawn_blocking(move || channel.request_feedback(&artifact))
            .await
            .map_err(|e| RedraftError::ExternalInput(format!("feedback task failed: {}", e)))??;

        Ok(match reply {
            FeedbackReply::Approved => Verdict::Approved,
            FeedbackReply::Revise(feedback) => Verdict::Fail(feedback),
        })
    }

    fn description(&self) -> &str {
        "human reviewer"
    }
}
