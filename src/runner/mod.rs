//! Loop execution.

mod controller;

pub use controller::{LoopController, RefineConfig};
