//! Generation layer: the Generator trait, the LLM-backed implementation, and
//! a scripted one for tests.

mod generator;
mod llm;

pub use generator::{Generator, ScriptedCall, ScriptedGenerator};
pub use llm::LlmGenerator;
