//! Candidate narrowing across repeated observations.

use crate::pattern::Pattern;
use crate::{io, Error, Result};

/// Keeps the candidates whose current bytes equal `pattern`.
///
/// Re-reads `pattern.len()` bytes at every candidate. A candidate whose read
/// fails is dropped and the pass continues; its page may simply have been
/// unmapped since the scan that produced it. The exception is a vanished
/// target process, which aborts the pass since nothing after it can succeed.
///
/// Narrowing an unchanged target with the same pattern is idempotent.
pub fn narrow(pid: i32, candidates: &[u64], pattern: &Pattern) -> Result<Vec<u64>> {
    let mut kept = Vec::with_capacity(candidates.len());
    let mut dropped = 0usize;

    for &addr in candidates {
        match io::read_exact_at(pid, addr, pattern.len()) {
            Ok(bytes) => {
                if bytes == pattern.bytes() {
                    kept.push(addr);
                }
            }
            Err(gone @ Error::NotFound(_)) => return Err(gone),
            Err(e) => {
                dropped += 1;
                tracing::warn!("pid {}: dropping candidate {:#x}: {}", pid, addr, e);
            }
        }
    }

    tracing::debug!(
        "pid {}: {} of {} candidates kept, {} dropped",
        pid,
        kept.len(),
        candidates.len(),
        dropped
    );
    Ok(kept)
}
