//! Target process probing and `/proc` path construction.
//!
//! Existence and permission are point-in-time facts about a live process, so
//! nothing here is cached; callers re-probe whenever the answer matters.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::{Error, Result};

/// Checks that `pid` names a live process this one is allowed to signal.
///
/// Sends signal 0, which performs no action beyond the kernel's existence and
/// permission checks. Returns [`Error::NotFound`] for a dead or never-alive
/// pid and [`Error::PermissionDenied`] when the process exists but belongs to
/// another user.
pub fn pid_exists(pid: i32) -> Result<()> {
    // pid 0 targets our own process group and negative pids fan out to whole
    // groups; neither is a scannable target.
    if pid <= 0 {
        return Err(Error::InvalidArgument(format!(
            "pid must be positive, got {pid}"
        )));
    }

    // SAFETY: kill(2) with signal 0 delivers nothing; it only runs the
    // kernel's pid lookup and permission check.
    let rc = unsafe { libc::kill(pid, 0) };
    if rc == 0 {
        return Ok(());
    }

    let errno = io::Error::last_os_error();
    match errno.raw_os_error() {
        Some(libc::ESRCH) => Err(Error::NotFound(pid)),
        Some(libc::EPERM) => Err(Error::PermissionDenied(pid)),
        _ => Err(Error::Io(errno)),
    }
}

/// Path to the maps listing for `pid`.
pub fn maps_path(pid: i32) -> PathBuf {
    PathBuf::from(format!("/proc/{pid}/maps"))
}

/// Path to the raw memory pseudo-file for `pid`.
pub fn mem_path(pid: i32) -> PathBuf {
    PathBuf::from(format!("/proc/{pid}/mem"))
}

/// Path to the executable symlink for `pid`.
pub fn exe_path(pid: i32) -> PathBuf {
    PathBuf::from(format!("/proc/{pid}/exe"))
}

/// Resolves the executable image path of `pid` by reading its `exe` symlink.
pub fn exe_target(pid: i32) -> Result<PathBuf> {
    fs::read_link(exe_path(pid)).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::NotFound(pid),
        io::ErrorKind::PermissionDenied => Error::PermissionDenied(pid),
        _ => Error::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proc_paths() {
        assert_eq!(maps_path(1234), PathBuf::from("/proc/1234/maps"));
        assert_eq!(mem_path(1234), PathBuf::from("/proc/1234/mem"));
        assert_eq!(exe_path(1), PathBuf::from("/proc/1/exe"));
    }

    #[test]
    fn test_pid_exists_self() {
        let pid = std::process::id() as i32;
        assert!(pid_exists(pid).is_ok());
    }

    #[test]
    fn test_pid_exists_rejects_nonpositive() {
        assert!(matches!(pid_exists(0), Err(Error::InvalidArgument(_))));
        assert!(matches!(pid_exists(-7), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_pid_exists_missing() {
        // Way beyond any default pid_max.
        assert!(matches!(pid_exists(i32::MAX), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_exe_target_self() {
        let pid = std::process::id() as i32;
        let exe = exe_target(pid).unwrap();
        assert!(exe.is_absolute());
    }
}
