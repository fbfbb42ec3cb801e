//! Fan-out/gather over metric probes and the synthesis step.
//!
//! Probes run concurrently and are joined before any state is written; each
//! result lands under its probe's own key, so the writes are disjoint by
//! construction. Synthesis is a single sequential step reading all keys.

use futures::future::join_all;
use serde_json::Value;

use crate::error::Result;
use crate::metrics::probes::Probe;
use crate::session::SessionState;

/// Run all probes concurrently and write each report to its session key.
///
/// A failing probe fails the gather; successful sibling results collected
/// before the failure are discarded with the run, never half-written.
pub async fn gather(state: &mut SessionState, probes: &[Box<dyn Probe>]) -> Result<()> {
    let snapshots = join_all(probes.iter().map(|probe| async move {
        let report = probe.collect().await?;
        Ok::<(&'static str, Value), crate::error::RedraftError>((probe.key(), report))
    }))
    .await;

    let mut collected = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        collected.push(snapshot?);
    }
    for (key, report) in collected {
        state.set(key, report);
    }
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const GIB: f64 = 1_073_741_824.0;
    const MIB: f64 = 1_048_576.0;
    let b = bytes as f64;
    if b >= GIB {
        format!("{:.1} GiB", b / GIB)
    } else {
        format!("{:.0} MiB", b / MIB)
    }
}

fn cpu_section(report: &Value) -> String {
    let logical = report["logical_cores"].as_u64().unwrap_or(0);
    let global = report["global_usage_percent"].as_f64().unwrap_or(0.0);
    let mut section = format!("## CPU\n- logical cores: {}\n- global usage: {:.1}%\n", logical, global);
    if global > 80.0 {
        section.push_str("- warning: high CPU usage\n");
    }
    section
}

fn memory_section(report: &Value) -> String {
    let total = report["total_bytes"].as_u64().unwrap_or(0);
    let used = report["used_bytes"].as_u64().unwrap_or(0);
    let percent = report["used_percent"].as_f64().unwrap_or(0.0);
    let mut section = format!(
        "## Memory\n- total: {}\n- used: {} ({:.1}%)\n",
        format_bytes(total),
        format_bytes(used),
        percent
    );
    if percent > 80.0 {
        section.push_str("- warning: high memory usage\n");
    }
    section
}

fn disk_section(report: &Value) -> String {
    let mut section = String::from("## Disk\n");
    match report["partitions"].as_array() {
        Some(partitions) if !partitions.is_empty() => {
            for partition in partitions {
                let mount = partition["mount_point"].as_str().unwrap_or("?");
                let total = partition["total_bytes"].as_u64().unwrap_or(0);
                let percent = partition["used_percent"].as_f64().unwrap_or(0.0);
                section.push_str(&format!("- {}: {} total, {:.1}% used", mount, format_bytes(total), percent));
                if percent > 85.0 {
                    section.push_str(" (warning: nearly full)");
                }
                section.push('\n');
            }
        }
        _ => section.push_str("- no partitions reported\n"),
    }
    section
}

/// Build a markdown system report from the gathered probe keys.
pub fn synthesize_report(state: &SessionState) -> String {
    let mut report = String::from("# System Report\n\n");

    match state.get("cpu_info") {
        Some(cpu) => report.push_str(&cpu_section(cpu)),
        None => report.push_str("## CPU\n- not collected\n"),
    }
    report.push('\n');

    match state.get("memory_info") {
        Some(memory) => report.push_str(&memory_section(memory)),
        None => report.push_str("## Memory\n- not collected\n"),
    }
    report.push('\n');

    match state.get("disk_info") {
        Some(disk) => report.push_str(&disk_section(disk)),
        None => report.push_str("## Disk\n- not collected\n"),
    }

    report
}
