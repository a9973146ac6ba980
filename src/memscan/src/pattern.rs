//! Byte pattern representation and buffer search.
//!
//! Two interchangeable search variants share one contract: match start
//! offsets are reported strictly left to right and never overlap; after a
//! match at `o` the search resumes at `o + pattern.len()`. The empty needle
//! matches at offset 0 only. [`Searcher`] precompiles whichever variant is
//! selected so one pattern can be run over many buffers.

use std::fmt;
use std::str::FromStr;

use memchr::memmem;

use crate::{Error, Result, MAX_PATTERN_LEN};

/// The byte encoding of a value being searched for.
///
/// Always between 1 and [`MAX_PATTERN_LEN`] bytes; how a typed value becomes
/// bytes is the caller's business, the scanner only compares them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern(Vec<u8>);

impl Pattern {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidArgument("pattern must not be empty".into()));
        }
        if bytes.len() > MAX_PATTERN_LEN {
            return Err(Error::InvalidArgument(format!(
                "pattern of {} bytes exceeds the {} byte limit",
                bytes.len(),
                MAX_PATTERN_LEN
            )));
        }
        Ok(Self(bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Buffer search variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Algorithm {
    /// Substring search via `memchr::memmem`.
    #[default]
    Standard,
    /// Boyer-Moore with bad-character and good-suffix shift tables.
    BoyerMoore,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Standard => write!(f, "standard"),
            Algorithm::BoyerMoore => write!(f, "boyer-moore"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standard" | "memmem" => Ok(Algorithm::Standard),
            "boyer-moore" | "bm" => Ok(Algorithm::BoyerMoore),
            _ => Err(Error::InvalidArgument(format!(
                "unknown algorithm {s:?}, expected \"standard\" or \"boyer-moore\""
            ))),
        }
    }
}

/// Finds every non-overlapping occurrence of `needle` in `haystack`.
pub fn find_all(haystack: &[u8], needle: &[u8], algorithm: Algorithm) -> Vec<usize> {
    Searcher::new(needle, algorithm).find_all(haystack)
}

/// A needle precompiled for one search variant.
pub enum Searcher<'n> {
    Standard(memmem::Finder<'n>),
    BoyerMoore(BoyerMoore),
}

impl<'n> Searcher<'n> {
    pub fn new(needle: &'n [u8], algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Standard => Searcher::Standard(memmem::Finder::new(needle)),
            Algorithm::BoyerMoore => Searcher::BoyerMoore(BoyerMoore::new(needle)),
        }
    }

    pub fn find_all(&self, haystack: &[u8]) -> Vec<usize> {
        match self {
            Searcher::Standard(finder) => {
                if finder.needle().is_empty() {
                    return vec![0];
                }
                // find_iter already yields non-overlapping occurrences,
                // resuming one needle length past each match.
                finder.find_iter(haystack).collect()
            }
            Searcher::BoyerMoore(bm) => bm.find_all(haystack),
        }
    }
}

/// Boyer-Moore searcher with both classic shift tables.
pub struct BoyerMoore {
    pattern: Vec<u8>,
    /// Shift per mismatched haystack byte: distance from the end of the
    /// pattern to that byte's rightmost occurrence before the final
    /// position, or the pattern length if there is none.
    bad: [usize; 256],
    /// Shift per matched-suffix length, from the two-pass construction:
    /// a forward pass over widening suffixes carrying the last position
    /// where the suffix is also a prefix, then a backward pass tightening
    /// entries by the maximal matching suffix length at each position.
    good: Vec<usize>,
}

impl BoyerMoore {
    pub fn new(pattern: &[u8]) -> Self {
        Self {
            bad: build_bad_char(pattern),
            good: build_good_suffix(pattern),
            pattern: pattern.to_vec(),
        }
    }

    /// Finds every non-overlapping occurrence of the pattern, left to right.
    pub fn find_all(&self, haystack: &[u8]) -> Vec<usize> {
        let pat = self.pattern.as_slice();
        let m = pat.len();
        let mut matches = Vec::new();
        if m == 0 {
            matches.push(0);
            return matches;
        }
        if m > haystack.len() {
            return matches;
        }

        // i tracks the haystack position aligned with the pattern byte under
        // comparison; windows are compared back to front.
        let mut i = m - 1;
        'windows: while i < haystack.len() {
            let mut j = m - 1;
            loop {
                if pat[j] != haystack[i] {
                    let matched = m - 1 - j;
                    i += self.good[matched].max(self.bad[haystack[i] as usize]);
                    continue 'windows;
                }
                if j == 0 {
                    matches.push(i);
                    // resume one full pattern length past the match
                    i += 2 * m - 1;
                    continue 'windows;
                }
                i -= 1;
                j -= 1;
            }
        }
        matches
    }
}

fn build_bad_char(pattern: &[u8]) -> [usize; 256] {
    let mut bad = [pattern.len(); 256];
    for (i, &byte) in pattern.iter().enumerate().take(pattern.len().saturating_sub(1)) {
        bad[byte as usize] = pattern.len() - 1 - i;
    }
    bad
}

/// Indexed by the number of pattern bytes already matched when the mismatch
/// happened. Every entry strictly exceeds its index, so each shift moves the
/// window forward.
fn build_good_suffix(pattern: &[u8]) -> Vec<usize> {
    let m = pattern.len();
    let mut table = vec![0usize; m];

    let mut last_prefix = m;
    for p in (1..=m).rev() {
        if is_prefix(pattern, p) {
            last_prefix = p;
        }
        table[m - p] = last_prefix + m - p;
    }

    for i in 0..m.saturating_sub(1) {
        let slen = suffix_length(pattern, i);
        table[slen] = m - 1 - i + slen;
    }

    table
}

/// Whether `pattern[p..]` is also a prefix of the pattern.
fn is_prefix(pattern: &[u8], p: usize) -> bool {
    pattern[p..] == pattern[..pattern.len() - p]
}

/// Length of the longest pattern suffix ending at position `p`.
fn suffix_length(pattern: &[u8], p: usize) -> usize {
    let mut len = 0;
    let mut i = p;
    let mut j = pattern.len() - 1;
    while pattern[i] == pattern[j] {
        len += 1;
        if i == 0 {
            break;
        }
        i -= 1;
        j -= 1;
    }
    len
}
