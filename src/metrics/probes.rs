//! System metric probes.
//!
//! Each probe is a read-only snapshot of one subsystem, reported as JSON and
//! written to its own session key. Probes share no mutable state, so running
//! them concurrently needs no locking.

use async_trait::async_trait;
use serde_json::{Value, json};
use sysinfo::{Disks, System};

use crate::error::Result;

/// A read-only metric probe.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Session key this probe's report is stored under.
    fn key(&self) -> &'static str;

    /// Take a snapshot and return it as JSON.
    async fn collect(&self) -> Result<Value>;
}

/// CPU core counts and per-core load snapshot.
pub struct CpuProbe;

#[async_trait]
impl Probe for CpuProbe {
    fn key(&self) -> &'static str {
        "cpu_info"
    }

    async fn collect(&self) -> Result<Value> {
        let report = tokio::task::spawn_blocking(|| {
            let mut system = System::new_all();
            system.refresh_all();

            let usages: Vec<f32> = system.cpus().iter().map(|cpu| cpu.cpu_usage()).collect();
            json!({
                "logical_cores": system.cpus().len(),
                "physical_cores": system.physical_core_count(),
                "global_usage_percent": system.global_cpu_usage(),
                "per_core_usage_percent": usages,
            })
        })
        .await
        .map_err(|e| crate::error::RedraftError::Probe(format!("cpu probe failed: {}", e)))?;
        Ok(report)
    }
}

/// Total, used, and swap memory snapshot.
pub struct MemoryProbe;

#[async_trait]
impl Probe for MemoryProbe {
    fn key(&self) -> &'static str {
        "memory_info"
    }

    async fn collect(&self) -> Result<Value> {
        let report = tokio::task::spawn_blocking(|| {
            let mut system = System::new_all();
            system.refresh_all();

            let total = system.total_memory();
            let used = system.used_memory();
            let percent = if total > 0 {
                (used as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            json!({
                "total_bytes": total,
                "used_bytes": used,
                "available_bytes": system.available_memory(),
                "used_percent": percent,
                "swap_total_bytes": system.total_swap(),
                "swap_used_bytes": system.used_swap(),
            })
        })
        .await
        .map_err(|e| crate::error::RedraftError::Probe(format!("memory probe failed: {}", e)))?;
        Ok(report)
    }
}

/// Per-partition capacity snapshot.
pub struct DiskProbe;

#[async_trait]
impl Probe for DiskProbe {
    fn key(&self) -> &'static str {
        "disk_info"
    }

    async fn collect(&self) -> Result<Value> {
        let report = tokio::task::spawn_blocking(|| {
            let disks = Disks::new_with_refreshed_list();
            let partitions: Vec<Value> = disks
                .iter()
                .map(|disk| {
                    let total = disk.total_space();
                    let available = disk.available_space();
                    let used_percent = if total > 0 {
                        ((total - available) as f64 / total as f64) * 100.0
                    } else {
                        0.0
                    };
                    json!({
                        "name": disk.name().to_string_lossy(),
                        "mount_point": disk.mount_point().to_string_lossy(),
                        "total_bytes": total,
                        "available_bytes": available,
                        "used_percent": used_percent,
                    })
                })
                .collect();
            json!({ "partitions": partitions })
        })
        .await
        .map_err(|e| crate::error::RedraftError::Probe(format!("disk probe failed: {}", e)))?;
        Ok(report)
    }
}

/// The default probe set: CPU, memory, disk.
pub fn default_probes() -> Vec<Box<dyn Probe>> {
    vec![Box::new(CpuProbe), Box::new(MemoryProbe), Box::new(DiskProbe)]
}
