//! Review layer: acceptance criteria, the rule reviewer, and the
//! human-in-the-loop reviewer.

mod criteria;
mod human;
mod reviewer;

pub use criteria::{AcceptanceCriteria, LengthCheck};
pub use human::{FeedbackChannel, FeedbackReply, HumanReviewer, StdinFeedback, parse_reply};
pub use reviewer::{Reviewer, RuleReviewer};
