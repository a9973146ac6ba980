//! Test-only fixture processes.

/// A paused child process carrying a copy of some bytes at a known address.
///
/// Forked from the test process before anything else runs in it, the child
/// sits in `pause()` with a single thread, so its mappings and their
/// contents hold still for the duration of a scan. Killed and reaped on
/// drop.
pub(crate) struct FrozenChild {
    pub pid: i32,
    /// Address of the byte copy inside the child.
    pub addr: u64,
}

impl FrozenChild {
    pub fn with_bytes(bytes: &[u8]) -> Self {
        let buffer = bytes.to_vec().into_boxed_slice();
        let addr = buffer.as_ptr() as u64;

        // SAFETY: the child runs nothing but an async-signal-safe pause loop,
        // so forking from a threaded test harness is fine.
        let pid = unsafe { libc::fork() };
        assert!(pid >= 0, "fork failed");
        if pid == 0 {
            loop {
                unsafe { libc::pause() };
            }
        }

        // The child keeps its own copy of the pages at the same address.
        drop(buffer);
        FrozenChild { pid, addr }
    }
}

impl Drop for FrozenChild {
    fn drop(&mut self) {
        // SAFETY: pid is our own forked child; kill then reap it.
        unsafe {
            libc::kill(self.pid, libc::SIGKILL);
            libc::waitpid(self.pid, std::ptr::null_mut(), 0);
        }
    }
}
