//! Memory region model and maps-listing enumeration.
//!
//! One [`MemoryChunk`] per maps line. The listing format is a stable kernel
//! ABI, so every line must parse; a line that does not match the grammar is a
//! fatal [`Error::Parse`] rather than something to skip over.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::{process, Error, Result};

/// Name shown for mappings with no backing pathname.
pub const ANONYMOUS: &str = "anonymous";

const HEAP: &str = "[heap]";
const STACK: &str = "[stack]";

/// Which mappings [`list_chunks`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every mapping in the listing.
    All,
    /// Only readable, writable, private mappings, the ones where an in-place
    /// value edit can stick without touching other processes.
    WritablePrivate,
}

/// A contiguous mapped region from a process maps listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryChunk {
    pub start: u64,
    /// Always greater than zero.
    pub size: u64,
    pub readable: bool,
    pub writable: bool,
    pub private: bool,
    /// Backing pathname; `None` for anonymous mappings.
    pub name: Option<String>,
}

impl MemoryChunk {
    /// End of the half-open range `[start, start + size)`.
    pub fn end(&self) -> u64 {
        self.start + self.size
    }

    pub fn is_writable_private(&self) -> bool {
        self.readable && self.writable && self.private
    }

    /// Display name for the backing object.
    pub fn backing_name(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS)
    }
}

/// Enumerates the mapped regions of `pid` in listing order.
///
/// The kernel emits lines ordered by start address and non-overlapping; a
/// fresh listing is read on every call since mappings appear and disappear
/// while the target runs.
pub fn list_chunks(pid: i32, scope: Scope) -> Result<Vec<MemoryChunk>> {
    let path = process::maps_path(pid);
    let file = File::open(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(pid),
        std::io::ErrorKind::PermissionDenied => Error::PermissionDenied(pid),
        _ => Error::Io(e),
    })?;

    let chunks = parse_listing(BufReader::new(file), scope)?;
    tracing::debug!("pid {}: {} chunks in scope {:?}", pid, chunks.len(), scope);
    Ok(chunks)
}

/// Narrows `chunks` to the regions backing the program itself: its
/// executable image, heap, and stack.
///
/// Library mappings and transient anonymous arenas churn between
/// observations; the program's own regions are where a value placed by the
/// program will live.
pub fn filter_program_chunks(pid: i32, chunks: Vec<MemoryChunk>) -> Result<Vec<MemoryChunk>> {
    let exe = process::exe_target(pid)?;
    Ok(retain_program_chunks(chunks, &exe))
}

fn retain_program_chunks(mut chunks: Vec<MemoryChunk>, exe: &Path) -> Vec<MemoryChunk> {
    chunks.retain(|chunk| match chunk.name.as_deref() {
        Some(HEAP) | Some(STACK) => true,
        Some(name) => Path::new(name) == exe,
        None => false,
    });
    chunks
}

fn parse_listing<R: BufRead>(reader: R, scope: Scope) -> Result<Vec<MemoryChunk>> {
    let mut chunks = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let chunk = parse_line(&line)?;
        if scope == Scope::WritablePrivate && !chunk.is_writable_private() {
            continue;
        }
        chunks.push(chunk);
    }
    Ok(chunks)
}

/// Parses one maps line:
/// `start-end perms offset dev inode [pathname]`, e.g.
/// `563ab000-563ac000 rw-p 00002000 08:01 393219   /usr/bin/target`.
fn parse_line(line: &str) -> Result<MemoryChunk> {
    let malformed = || Error::Parse {
        line: line.to_string(),
    };

    let mut fields = line.splitn(6, ' ');
    let range = fields.next().ok_or_else(malformed)?;
    let perms = fields.next().ok_or_else(malformed)?;
    let offset = fields.next().ok_or_else(malformed)?;
    let device = fields.next().ok_or_else(malformed)?;
    let inode = fields.next().ok_or_else(malformed)?;

    let (start, end) = range.split_once('-').ok_or_else(malformed)?;
    let start = u64::from_str_radix(start, 16).map_err(|_| malformed())?;
    let end = u64::from_str_radix(end, 16).map_err(|_| malformed())?;
    if end <= start {
        return Err(malformed());
    }

    let &[r, w, x, p] = perms.as_bytes() else {
        return Err(malformed());
    };
    if !matches!(r, b'r' | b'-')
        || !matches!(w, b'w' | b'-')
        || !matches!(x, b'x' | b'-')
        || !matches!(p, b'p' | b's')
    {
        return Err(malformed());
    }

    u64::from_str_radix(offset, 16).map_err(|_| malformed())?;
    let (major, minor) = device.split_once(':').ok_or_else(malformed)?;
    u32::from_str_radix(major, 16).map_err(|_| malformed())?;
    u32::from_str_radix(minor, 16).map_err(|_| malformed())?;
    inode.parse::<u64>().map_err(|_| malformed())?;

    // The pathname column is padded with spaces for alignment; everything
    // after the padding, including embedded spaces, belongs to the name.
    let name = fields
        .next()
        .map(str::trim_start)
        .filter(|name| !name.is_empty())
        .map(String::from);

    Ok(MemoryChunk {
        start,
        size: end - start,
        readable: r == b'r',
        writable: w == b'w',
        private: p == b'p',
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    #[test]
    fn test_parse_line_named() {
        let chunk =
            parse_line("563ab000-563ac000 r--p 00000000 08:01 393219   /usr/bin/target").unwrap();
        assert_eq!(chunk.start, 0x563a_b000);
        assert_eq!(chunk.size, 0x1000);
        assert_eq!(chunk.end(), 0x563a_c000);
        assert!(chunk.readable);
        assert!(!chunk.writable);
        assert!(chunk.private);
        assert_eq!(chunk.name.as_deref(), Some("/usr/bin/target"));
        assert_eq!(chunk.backing_name(), "/usr/bin/target");
    }

    #[test]
    fn test_parse_line_anonymous() {
        let chunk = parse_line("7f1200000000-7f1200021000 rw-p 00000000 00:00 0").unwrap();
        assert_eq!(chunk.name, None);
        assert_eq!(chunk.backing_name(), ANONYMOUS);
        assert!(chunk.is_writable_private());
    }

    #[test]
    fn test_parse_line_heap() {
        let chunk = parse_line("55e000-57f000 rw-p 00000000 00:00 0    [heap]").unwrap();
        assert_eq!(chunk.name.as_deref(), Some("[heap]"));
    }

    #[test]
    fn test_parse_line_name_with_spaces() {
        let chunk =
            parse_line("7f00-8f00 r-xs 00000000 08:01 42   /tmp/with space (deleted)").unwrap();
        assert_eq!(chunk.name.as_deref(), Some("/tmp/with space (deleted)"));
        assert!(!chunk.private);
    }

    #[test]
    fn test_parse_line_shared_not_writable_private() {
        let chunk = parse_line("7f00-8f00 rw-s 00000000 00:05 1024").unwrap();
        assert!(chunk.readable && chunk.writable);
        assert!(!chunk.is_writable_private());
    }

    #[test]
    fn test_parse_line_malformed() {
        let bad = [
            "",
            "563ab000 r--p 00000000 08:01 0",
            "563ab000-563ac000",
            "563ab000-563ac000 r--b 00000000 08:01 0",
            "563ab000-563ac000 r-p 00000000 08:01 0",
            "563ab000-563ac000 r--p zz 08:01 0",
            "563ab000-563ac000 r--p 00000000 0801 0",
            "563ab000-563ac000 r--p 00000000 08:01 x",
            "zzz-563ac000 r--p 00000000 08:01 0",
        ];
        for line in bad {
            assert!(
                matches!(parse_line(line), Err(Error::Parse { .. })),
                "line should not parse: {line:?}"
            );
        }
    }

    #[test]
    fn test_parse_line_empty_range() {
        assert!(matches!(
            parse_line("563ab000-563ab000 r--p 00000000 08:01 0"),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            parse_line("563ac000-563ab000 r--p 00000000 08:01 0"),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_listing_scope() {
        let listing = "\
1000-2000 r--p 00000000 08:01 1   /usr/bin/target
3000-4000 rw-p 00000000 00:00 0   [heap]
5000-6000 rw-s 00000000 00:05 2
7000-8000 rw-p 00000000 00:00 0
";
        let all = parse_listing(Cursor::new(listing), Scope::All).unwrap();
        assert_eq!(all.len(), 4);

        let writable = parse_listing(Cursor::new(listing), Scope::WritablePrivate).unwrap();
        assert_eq!(writable.len(), 2);
        assert!(writable.iter().all(MemoryChunk::is_writable_private));
        assert_eq!(writable[0].start, 0x3000);
        assert_eq!(writable[1].start, 0x7000);
    }

    #[test]
    fn test_parse_listing_rejects_bad_line() {
        let listing = "1000-2000 r--p 00000000 08:01 1\nnot a maps line\n";
        assert!(parse_listing(Cursor::new(listing), Scope::All).is_err());
    }

    #[test]
    fn test_retain_program_chunks() {
        let exe = PathBuf::from("/usr/bin/target");
        let mk = |name: Option<&str>| MemoryChunk {
            start: 0x1000,
            size: 0x1000,
            readable: true,
            writable: true,
            private: true,
            name: name.map(String::from),
        };
        let chunks = vec![
            mk(Some("/usr/bin/target")),
            mk(Some("[heap]")),
            mk(Some("[stack]")),
            mk(Some("/usr/lib/libc.so.6")),
            mk(Some("[vvar]")),
            mk(None),
        ];
        let kept = retain_program_chunks(chunks, &exe);
        let names: Vec<_> = kept.iter().map(MemoryChunk::backing_name).collect();
        assert_eq!(names, vec!["/usr/bin/target", "[heap]", "[stack]"]);
    }

    #[test]
    fn test_list_chunks_self() {
        let pid = std::process::id() as i32;

        let all = list_chunks(pid, Scope::All).unwrap();
        assert!(!all.is_empty());
        for pair in all.windows(2) {
            assert!(pair[0].end() <= pair[1].start, "chunks overlap or unsorted");
        }
        assert!(all.iter().all(|c| c.size > 0));
        assert!(all.iter().any(|c| c.name.as_deref() == Some("[stack]")));

        let writable = list_chunks(pid, Scope::WritablePrivate).unwrap();
        assert!(!writable.is_empty());
        assert!(writable.iter().all(MemoryChunk::is_writable_private));
        assert!(writable.len() <= all.len());
    }

    #[test]
    fn test_filter_program_chunks_self() {
        let pid = std::process::id() as i32;
        let chunks = list_chunks(pid, Scope::WritablePrivate).unwrap();
        let program = filter_program_chunks(pid, chunks).unwrap();
        assert!(program.iter().any(|c| c.name.as_deref() == Some("[stack]")));
    }
}
