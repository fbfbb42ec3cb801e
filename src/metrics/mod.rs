//! System metrics: concurrent probes over disjoint session keys, then a
//! single synthesis step.

mod probes;
mod report;

pub use probes::{CpuProbe, DiskProbe, MemoryProbe, Probe, default_probes};
pub use report::{gather, synthesize_report};
