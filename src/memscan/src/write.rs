//! Applying a replacement value to surviving addresses.

use crate::io::{self, BatchOutcome};
use crate::pattern::Pattern;

/// Writes `pattern` to every address in `addrs`.
///
/// Individual failures do not stop the batch; each address ends up in the
/// outcome either as written or as failed with its reason. The common failure
/// is a stale address whose page went away between narrowing and writing.
pub fn apply(pid: i32, addrs: &[u64], pattern: &Pattern) -> BatchOutcome {
    let outcome = io::write_many(pid, addrs, pattern.bytes());
    if outcome.all_ok() {
        tracing::debug!(
            "pid {}: wrote {} bytes to {} addresses",
            pid,
            pattern.len(),
            outcome.written
        );
    } else {
        tracing::warn!(
            "pid {}: {} of {} writes failed",
            pid,
            outcome.failures.len(),
            addrs.len()
        );
    }
    outcome
}
