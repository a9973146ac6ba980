//! Parallel scan coordination.
//!
//! The region sequence is split into contiguous partitions, one per usable
//! core, and scanned by scoped worker threads that pin themselves to their
//! core before touching memory. Workers share nothing but the match list
//! behind a mutex; everything else lives in a per-call [`ScanContext`], so
//! concurrent scans of different targets do not interfere.

use std::io;
use std::mem;
use std::sync::Mutex;
use std::thread;

use crate::pattern::{Pattern, Searcher};
use crate::region::MemoryChunk;
use crate::scan::{scan_targets, ScanOptions};
use crate::{io as memio, process, Error, Result};

/// One worker's contiguous slice of the region sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub start: usize,
    pub len: usize,
}

/// Everything one parallel pass shares, owned by the coordinating call.
struct ScanContext<'a> {
    pid: i32,
    chunks: &'a [MemoryChunk],
    searcher: &'a Searcher<'a>,
    matches: Mutex<Vec<u64>>,
}

/// Scans the selected regions of `pid` with one worker per usable core.
///
/// The usable cores are read from the calling thread's affinity mask at call
/// time. When `options.workers` is set it must equal that count; a mismatch
/// is a hard error, not a fallback to some other width. Any worker failure,
/// pinning included, fails the whole pass rather than returning a silently
/// incomplete match list.
///
/// The returned addresses are sorted, which makes the result identical to
/// the serial path over an unchanged target.
pub fn execute_scan_parallel(pid: i32, pattern: &Pattern, options: &ScanOptions) -> Result<Vec<u64>> {
    process::pid_exists(pid)?;

    let cores = allowed_cores()?;
    if let Some(configured) = options.workers {
        if configured != cores.len() {
            return Err(Error::Concurrency(format!(
                "configured for {} workers but {} cores are usable",
                configured,
                cores.len()
            )));
        }
    }

    let chunks = scan_targets(pid, options.scope)?;
    let searcher = Searcher::new(pattern.bytes(), options.algorithm);
    let partitions = partition(chunks.len(), cores.len());
    let ctx = ScanContext {
        pid,
        chunks: &chunks,
        searcher: &searcher,
        matches: Mutex::new(Vec::new()),
    };

    thread::scope(|scope| -> Result<()> {
        let mut handles = Vec::with_capacity(partitions.len());
        for (worker, (&core, &part)) in cores.iter().zip(partitions.iter()).enumerate() {
            let ctx = &ctx;
            let handle = thread::Builder::new()
                .name(format!("scan-{worker}"))
                .spawn_scoped(scope, move || scan_partition(ctx, part, core))
                .map_err(|e| {
                    Error::Concurrency(format!("failed to spawn worker {worker}: {e}"))
                })?;
            handles.push((worker, handle));
        }

        for (worker, handle) in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    return Err(Error::Concurrency(format!("worker {worker} failed: {e}")))
                }
                Err(_) => return Err(Error::Concurrency(format!("worker {worker} panicked"))),
            }
        }
        Ok(())
    })?;

    let mut matches = ctx
        .matches
        .into_inner()
        .map_err(|_| Error::Concurrency("match list mutex poisoned".into()))?;
    matches.sort_unstable();

    tracing::debug!(
        "pid {}: {} matches across {} chunks with {} workers",
        pid,
        matches.len(),
        chunks.len(),
        cores.len()
    );
    Ok(matches)
}

/// Body of one worker: pin, then scan the assigned partition chunk by chunk,
/// publishing each chunk's matches under a single lock acquisition.
fn scan_partition(ctx: &ScanContext, part: Partition, core: usize) -> Result<()> {
    pin_to_core(core)?;

    for chunk in &ctx.chunks[part.start..part.start + part.len] {
        let buffer = memio::read_chunk(ctx.pid, chunk)?;
        let found: Vec<u64> = ctx
            .searcher
            .find_all(&buffer)
            .into_iter()
            .map(|offset| chunk.start + offset as u64)
            .collect();
        if !found.is_empty() {
            let mut matches = ctx
                .matches
                .lock()
                .map_err(|_| Error::Concurrency("match list mutex poisoned".into()))?;
            matches.extend(found);
        }
    }
    Ok(())
}

/// Splits `count` regions into `workers` contiguous partitions with sizes
/// differing by at most one; the first `count % workers` partitions carry
/// the extra region.
pub(crate) fn partition(count: usize, workers: usize) -> Vec<Partition> {
    let base = count / workers;
    let extra = count % workers;
    let mut parts = Vec::with_capacity(workers);
    let mut start = 0;
    for worker in 0..workers {
        let len = base + usize::from(worker < extra);
        parts.push(Partition { start, len });
        start += len;
    }
    parts
}

/// Core ids the calling thread may run on, from its affinity mask.
///
/// Using the mask, not the machine's online-CPU count, keeps detection and
/// pinning consistent inside cpuset-restricted environments.
fn allowed_cores() -> Result<Vec<usize>> {
    // SAFETY: a zeroed cpu_set_t is a valid empty set for the kernel to fill.
    let mut set: libc::cpu_set_t = unsafe { mem::zeroed() };
    let rc = unsafe { libc::sched_getaffinity(0, mem::size_of::<libc::cpu_set_t>(), &mut set) };
    if rc != 0 {
        return Err(Error::Io(io::Error::last_os_error()));
    }

    let mut cores = Vec::new();
    for cpu in 0..libc::CPU_SETSIZE as usize {
        // SAFETY: cpu is within CPU_SETSIZE.
        if unsafe { libc::CPU_ISSET(cpu, &set) } {
            cores.push(cpu);
        }
    }
    if cores.is_empty() {
        return Err(Error::Concurrency("affinity mask is empty".into()));
    }
    Ok(cores)
}

/// Restricts the calling thread to one core.
fn pin_to_core(core: usize) -> Result<()> {
    let mut set: libc::cpu_set_t = unsafe { mem::zeroed() };
    // SAFETY: set is a valid cpu_set_t and core is within CPU_SETSIZE.
    unsafe {
        libc::CPU_ZERO(&mut set);
        libc::CPU_SET(core, &mut set);
    }
    let rc = unsafe { libc::sched_setaffinity(0, mem::size_of::<libc::cpu_set_t>(), &set) };
    if rc != 0 {
        return Err(Error::Concurrency(format!(
            "failed to pin to core {core}: {}",
            io::Error::last_os_error()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{execute_scan, ScanScope};
    use crate::testutil::FrozenChild;

    fn self_pid() -> i32 {
        std::process::id() as i32
    }

    fn writable_options() -> ScanOptions {
        ScanOptions {
            scope: ScanScope::WritablePrivate,
            ..ScanOptions::default()
        }
    }

    #[test]
    fn test_partition_spreads_remainder() {
        let parts = partition(10, 4);
        assert_eq!(
            parts,
            vec![
                Partition { start: 0, len: 3 },
                Partition { start: 3, len: 3 },
                Partition { start: 6, len: 2 },
                Partition { start: 8, len: 2 },
            ]
        );
    }

    #[test]
    fn test_partition_invariants() {
        for count in 0..50 {
            for workers in 1..=8 {
                let parts = partition(count, workers);
                assert_eq!(parts.len(), workers);

                let total: usize = parts.iter().map(|p| p.len).sum();
                assert_eq!(total, count, "count {count} workers {workers}");

                let mut next = 0;
                for part in &parts {
                    assert_eq!(part.start, next, "count {count} workers {workers}");
                    next += part.len;
                }

                let max = parts.iter().map(|p| p.len).max().unwrap();
                let min = parts.iter().map(|p| p.len).min().unwrap();
                assert!(max - min <= 1, "count {count} workers {workers}");
            }
        }
    }

    #[test]
    fn test_partition_more_workers_than_regions() {
        let parts = partition(2, 5);
        assert_eq!(parts.iter().map(|p| p.len).sum::<usize>(), 2);
        assert_eq!(parts[0].len, 1);
        assert_eq!(parts[1].len, 1);
        assert!(parts[2..].iter().all(|p| p.len == 0));
    }

    #[test]
    fn test_allowed_cores_nonempty() {
        let cores = allowed_cores().unwrap();
        assert!(!cores.is_empty());
        assert!(cores.len() <= libc::CPU_SETSIZE as usize);
    }

    #[test]
    fn test_pin_to_allowed_core() {
        let cores = allowed_cores().unwrap();
        pin_to_core(cores[0]).unwrap();
    }

    #[test]
    fn test_parallel_agrees_with_serial() {
        let mut buffer = vec![0u8; 8192];
        buffer[100..104].copy_from_slice(&[0xe8, 0x03, 0x00, 0x00]);
        buffer[2000..2004].copy_from_slice(&[0xe8, 0x03, 0x00, 0x00]);
        let child = FrozenChild::with_bytes(&buffer);
        let pattern = Pattern::from_bytes(vec![0xe8, 0x03, 0x00, 0x00]).unwrap();

        let serial = execute_scan(child.pid, &pattern, &writable_options()).unwrap();
        let parallel = execute_scan_parallel(child.pid, &pattern, &writable_options()).unwrap();

        assert!(parallel.contains(&(child.addr + 100)));
        assert!(parallel.contains(&(child.addr + 2000)));
        // serial results come out ascending already, so the sorted parallel
        // set must line up exactly on an unchanged target
        assert_eq!(parallel, serial);
    }

    #[test]
    fn test_parallel_rejects_worker_count_mismatch() {
        let pattern = Pattern::from_bytes(vec![1, 2, 3, 4]).unwrap();
        let opts = ScanOptions {
            workers: Some(10_000),
            ..writable_options()
        };
        let err = execute_scan_parallel(self_pid(), &pattern, &opts).unwrap_err();
        assert!(matches!(err, Error::Concurrency(_)), "got {err:?}");
    }

    #[test]
    fn test_parallel_accepts_matching_worker_count() {
        let child = FrozenChild::with_bytes(&[0x42; 64]);
        let detected = allowed_cores().unwrap().len();
        let pattern = Pattern::from_bytes(vec![0x42; 4]).unwrap();
        let opts = ScanOptions {
            workers: Some(detected),
            ..writable_options()
        };
        assert!(execute_scan_parallel(child.pid, &pattern, &opts).is_ok());
    }

    #[test]
    fn test_parallel_missing_process() {
        let pattern = Pattern::from_bytes(vec![1]).unwrap();
        let err = execute_scan_parallel(i32::MAX, &pattern, &ScanOptions::default()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
