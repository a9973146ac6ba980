//! # memscan
//!
//! Out-of-process memory scanner and editor for Linux.
//!
//! This library provides functionality to:
//! - Enumerate the mapped memory regions of a running process
//! - Search those regions for the byte encoding of a typed value
//! - Narrow a candidate address set across repeated observations
//! - Write a new value into the addresses that survive narrowing
//!
//! All access goes through `/proc` metadata and the `process_vm_readv(2)` /
//! `process_vm_writev(2)` syscalls; the target process is never ptrace-stopped
//! and keeps running while it is scanned.
//!
//! ## Example
//!
//! ```no_run
//! use memscan::{Pattern, ScanOptions};
//!
//! # fn main() -> Result<(), memscan::Error> {
//! let pid = 4242;
//! memscan::pid_exists(pid)?;
//!
//! // Find every occurrence of the i32 value 1000
//! let pattern = Pattern::from_bytes(1000i32.to_le_bytes().to_vec())?;
//! let mut matches = memscan::execute_scan(pid, &pattern, &ScanOptions::default())?;
//! println!("{} candidate addresses", matches.len());
//!
//! // ... let the value change inside the target, then narrow ...
//! let pattern = Pattern::from_bytes(999i32.to_le_bytes().to_vec())?;
//! matches = memscan::narrow(pid, &matches, &pattern)?;
//!
//! // Overwrite the survivors
//! let replacement = Pattern::from_bytes(1_000_000i32.to_le_bytes().to_vec())?;
//! let outcome = memscan::apply(pid, &matches, &replacement);
//! println!("wrote {} of {} addresses", outcome.written, matches.len());
//! # Ok(())
//! # }
//! ```

pub mod filter;
pub mod io;
pub mod parallel;
pub mod pattern;
pub mod process;
pub mod region;
pub mod scan;
#[cfg(test)]
mod testutil;
pub mod write;

// Re-export commonly used items
#[doc(inline)]
pub use filter::narrow;
#[doc(inline)]
pub use io::{read_chunk, read_exact_at, write_at, write_many, BatchOutcome};
#[doc(inline)]
pub use parallel::{execute_scan_parallel, Partition};
#[doc(inline)]
pub use pattern::{find_all, Algorithm, Pattern, Searcher};
#[doc(inline)]
pub use process::pid_exists;
#[doc(inline)]
pub use region::{filter_program_chunks, list_chunks, MemoryChunk, Scope};
#[doc(inline)]
pub use scan::{execute_scan, ScanOptions, ScanScope};
#[doc(inline)]
pub use write::apply;

/// Longest value encoding accepted from callers: a 1023-byte string plus its
/// NUL terminator.
pub const MAX_PATTERN_LEN: usize = 1024;

/// Errors from process probing, region listing, scanning, and editing
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No such process: pid {0}")]
    NotFound(i32),

    #[error("Not permitted to access process {0}")]
    PermissionDenied(i32),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed maps line: {line:?}")]
    Parse { line: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Short transfer at {addr:#x}: expected {expected} bytes, moved {actual}")]
    ShortTransfer {
        addr: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Concurrency failure: {0}")]
    Concurrency(String),
}

pub type Result<T> = std::result::Result<T, Error>;
