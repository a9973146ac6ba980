//! Serial scan driver: enumerate regions, read each one, search it, and
//! translate buffer offsets into absolute addresses.

use std::fmt;
use std::str::FromStr;

use crate::pattern::{Algorithm, Pattern, Searcher};
use crate::region::{self, MemoryChunk, Scope};
use crate::{io, process, Error, Result};

/// Which regions a scan covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanScope {
    /// The target's own image, heap, and stack, out of its writable private
    /// mappings. Where a program keeps the values it owns.
    #[default]
    Program,
    /// Every writable private mapping, transient arenas included.
    WritablePrivate,
    /// Every readable mapping, shared ones and libraries included. Slower
    /// and noisier.
    All,
}

impl fmt::Display for ScanScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanScope::Program => write!(f, "program"),
            ScanScope::WritablePrivate => write!(f, "writable"),
            ScanScope::All => write!(f, "all"),
        }
    }
}

impl FromStr for ScanScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "program" => Ok(ScanScope::Program),
            "writable" => Ok(ScanScope::WritablePrivate),
            "all" => Ok(ScanScope::All),
            _ => Err(Error::InvalidArgument(format!(
                "unknown scope {s:?}, expected \"program\", \"writable\" or \"all\""
            ))),
        }
    }
}

/// Options shared by the serial and parallel scan entry points.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub scope: ScanScope,
    pub algorithm: Algorithm,
    /// Fixed worker count for [`crate::execute_scan_parallel`]. When set it
    /// must equal the detected core count; the serial path ignores it.
    pub workers: Option<usize>,
}

/// Resolves the region set a scan pass will read.
pub(crate) fn scan_targets(pid: i32, scope: ScanScope) -> Result<Vec<MemoryChunk>> {
    match scope {
        ScanScope::Program => {
            let chunks = region::list_chunks(pid, Scope::WritablePrivate)?;
            region::filter_program_chunks(pid, chunks)
        }
        ScanScope::WritablePrivate => region::list_chunks(pid, Scope::WritablePrivate),
        ScanScope::All => {
            let mut chunks = region::list_chunks(pid, Scope::All)?;
            // an unreadable mapping cannot hold an observable value
            chunks.retain(|chunk| chunk.readable);
            Ok(chunks)
        }
    }
}

/// Scans the selected regions of `pid` for `pattern`, one chunk at a time.
///
/// Returns absolute addresses in discovery order. Region listings and chunk
/// contents are read fresh on every call; a failed read of an in-scope chunk
/// aborts the whole pass.
pub fn execute_scan(pid: i32, pattern: &Pattern, options: &ScanOptions) -> Result<Vec<u64>> {
    process::pid_exists(pid)?;
    let chunks = scan_targets(pid, options.scope)?;
    let searcher = Searcher::new(pattern.bytes(), options.algorithm);

    let mut matches = Vec::new();
    let mut scanned: u64 = 0;
    for chunk in &chunks {
        let buffer = io::read_chunk(pid, chunk)?;
        for offset in searcher.find_all(&buffer) {
            matches.push(chunk.start + offset as u64);
        }
        scanned += chunk.size;
    }

    tracing::debug!(
        "pid {}: {} matches across {} chunks ({} bytes, {:?})",
        pid,
        matches.len(),
        chunks.len(),
        scanned,
        options.algorithm
    );
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FrozenChild;
    use crate::{filter, write};
    use std::sync::atomic::{AtomicU8, Ordering};

    fn self_pid() -> i32 {
        std::process::id() as i32
    }

    fn value_buffer() -> Vec<u8> {
        let mut buffer = vec![0u8; 4096];
        buffer[100..104].copy_from_slice(&[0xe8, 0x03, 0x00, 0x00]);
        buffer[2000..2004].copy_from_slice(&[0xe8, 0x03, 0x00, 0x00]);
        buffer
    }

    // Lives in the executable image's writable data section, so a
    // program-scope scan must see it.
    static SCAN_ANCHOR: [AtomicU8; 8] = [
        AtomicU8::new(0xb7),
        AtomicU8::new(0x1d),
        AtomicU8::new(0x5a),
        AtomicU8::new(0xee),
        AtomicU8::new(0x40),
        AtomicU8::new(0x9f),
        AtomicU8::new(0x33),
        AtomicU8::new(0x7c),
    ];

    #[test]
    fn test_scan_program_scope_finds_image_data() {
        // The child shares our executable image, anchor address included.
        let child = FrozenChild::with_bytes(&[0]);
        let bytes: Vec<u8> = SCAN_ANCHOR
            .iter()
            .map(|b| b.load(Ordering::Relaxed))
            .collect();
        let pattern = Pattern::from_bytes(bytes).unwrap();

        let opts = ScanOptions {
            scope: ScanScope::Program,
            ..ScanOptions::default()
        };
        let matches = execute_scan(child.pid, &pattern, &opts).unwrap();
        let anchor = SCAN_ANCHOR.as_ptr() as u64;
        assert!(
            matches.contains(&anchor),
            "anchor {anchor:#x} missing from {matches:#x?}"
        );
    }

    #[test]
    fn test_scan_finds_planted_values_with_both_algorithms() {
        let child = FrozenChild::with_bytes(&value_buffer());
        let pattern = Pattern::from_bytes(vec![0xe8, 0x03, 0x00, 0x00]).unwrap();

        for algorithm in [Algorithm::Standard, Algorithm::BoyerMoore] {
            let opts = ScanOptions {
                scope: ScanScope::WritablePrivate,
                algorithm,
                workers: None,
            };
            let matches = execute_scan(child.pid, &pattern, &opts).unwrap();
            assert!(matches.contains(&(child.addr + 100)), "{algorithm}");
            assert!(matches.contains(&(child.addr + 2000)), "{algorithm}");
        }
    }

    #[test]
    fn test_scan_narrow_write_cycle() {
        let child = FrozenChild::with_bytes(&value_buffer());
        let candidates = vec![child.addr + 100, child.addr + 2000];

        let old = Pattern::from_bytes(vec![0xe8, 0x03, 0x00, 0x00]).unwrap();
        let survivors = filter::narrow(child.pid, &candidates, &old).unwrap();
        assert_eq!(survivors, candidates);

        // the value at offset 100 changes between observations
        crate::io::write_at(child.pid, child.addr + 100, &[0xe7]).unwrap();

        let survivors = filter::narrow(child.pid, &candidates, &old).unwrap();
        assert_eq!(survivors, vec![child.addr + 2000]);

        let new = Pattern::from_bytes(vec![0xe7, 0x03, 0x00, 0x00]).unwrap();
        let survivors = filter::narrow(child.pid, &candidates, &new).unwrap();
        assert_eq!(survivors, vec![child.addr + 100]);

        // edit the survivor and observe the bytes land
        let replacement = Pattern::from_bytes(vec![0xaa, 0xbb, 0xcc, 0xdd]).unwrap();
        let outcome = write::apply(child.pid, &[child.addr + 2000], &replacement);
        assert!(outcome.all_ok());
        assert_eq!(
            crate::io::read_exact_at(child.pid, child.addr + 2000, 4).unwrap(),
            vec![0xaa, 0xbb, 0xcc, 0xdd]
        );
    }

    #[test]
    fn test_scan_missing_process() {
        let pattern = Pattern::from_bytes(vec![1, 2, 3]).unwrap();
        let err = execute_scan(i32::MAX, &pattern, &ScanOptions::default()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_scan_scope_round_trips_through_str() {
        for scope in [ScanScope::Program, ScanScope::WritablePrivate, ScanScope::All] {
            assert_eq!(scope.to_string().parse::<ScanScope>().unwrap(), scope);
        }
        assert!("everything".parse::<ScanScope>().is_err());
    }

    #[test]
    fn test_scan_targets_all_keeps_only_readable() {
        let chunks = scan_targets(self_pid(), ScanScope::All).unwrap();
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.readable));
    }
}
