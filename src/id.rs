//! ID generation utilities for Redraft
//!
//! Provides functions for generating unique session identifiers.

use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a unique session ID
///
/// Format: `{timestamp_ms}-{hash_hex}`
/// Example: `1738300800123-a1b2`
///
/// The suffix is the first two bytes of a SHA-256 over the timestamp, the
/// process id, and a process-local counter, so ids generated within the same
/// millisecond stay distinct.
pub fn generate_session_id() -> String {
    let timestamp = now_ms();
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut hasher = Sha256::new();
    hasher.update(timestamp.to_be_bytes());
    hasher.update(std::process::id().to_be_bytes());
    hasher.update(count.to_be_bytes());
    let digest = hasher.finalize();

    format!("{}-{}", timestamp, hex::encode(&digest[..2]))
}
