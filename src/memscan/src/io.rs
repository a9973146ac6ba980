//! Cross-process reads and writes.
//!
//! Everything goes through `process_vm_readv(2)` / `process_vm_writev(2)`
//! with one iovec pair per call. Both syscalls report how many bytes actually
//! moved, and a transfer of fewer bytes than requested leaves the caller with
//! a buffer of unknown validity, so anything but an exact transfer is an
//! error here.

use std::io;

use crate::region::MemoryChunk;
use crate::{Error, Result};

/// Outcome of applying one payload to a batch of addresses.
///
/// Batches keep going past individual failures; every address gets exactly
/// one entry, either in `written` or in `failures`.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Number of addresses written successfully.
    pub written: usize,
    /// Addresses that could not be written, with the reason.
    pub failures: Vec<(u64, Error)>,
}

impl BatchOutcome {
    pub fn all_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Reads exactly `len` bytes at `addr` in the address space of `pid`.
pub fn read_exact_at(pid: i32, addr: u64, len: usize) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; len];
    let local = libc::iovec {
        iov_base: buffer.as_mut_ptr() as *mut libc::c_void,
        iov_len: len,
    };
    let remote = libc::iovec {
        iov_base: addr as *mut libc::c_void,
        iov_len: len,
    };

    // SAFETY: local points at our freshly allocated buffer of exactly
    // iov_len bytes; the kernel validates the remote side.
    let moved = unsafe { libc::process_vm_readv(pid, &local, 1, &remote, 1, 0) };
    check_transfer(pid, addr, len, moved)?;
    Ok(buffer)
}

/// Reads the full contents of one mapped chunk.
pub fn read_chunk(pid: i32, chunk: &MemoryChunk) -> Result<Vec<u8>> {
    read_exact_at(pid, chunk.start, chunk.size as usize)
}

/// Writes all of `bytes` at `addr` in the address space of `pid`.
pub fn write_at(pid: i32, addr: u64, bytes: &[u8]) -> Result<()> {
    let local = libc::iovec {
        iov_base: bytes.as_ptr() as *mut libc::c_void,
        iov_len: bytes.len(),
    };
    let remote = libc::iovec {
        iov_base: addr as *mut libc::c_void,
        iov_len: bytes.len(),
    };

    // SAFETY: local points at the caller's slice and is only read from; the
    // kernel validates the remote side.
    let moved = unsafe { libc::process_vm_writev(pid, &local, 1, &remote, 1, 0) };
    check_transfer(pid, addr, bytes.len(), moved)
}

/// Writes the same payload to every address, continuing past failures.
pub fn write_many(pid: i32, addrs: &[u64], bytes: &[u8]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for &addr in addrs {
        match write_at(pid, addr, bytes) {
            Ok(()) => outcome.written += 1,
            Err(e) => outcome.failures.push((addr, e)),
        }
    }
    outcome
}

fn check_transfer(pid: i32, addr: u64, expected: usize, moved: isize) -> Result<()> {
    if moved < 0 {
        let errno = io::Error::last_os_error();
        return Err(match errno.raw_os_error() {
            Some(libc::ESRCH) => Error::NotFound(pid),
            Some(libc::EPERM) => Error::PermissionDenied(pid),
            _ => Error::Io(errno),
        });
    }
    if moved as usize != expected {
        return Err(Error::ShortTransfer {
            addr,
            expected,
            actual: moved as usize,
        });
    }
    Ok(())
}
