//! Memory command handlers
//!
//! Handlers for listing regions, one-shot scans, raw reads, and typed
//! writes.

use std::time::Instant;

use anyhow::{Context, Result};
use memscan::{Algorithm, MemoryChunk, ScanOptions, ScanScope, Scope};

use crate::config::Config;
use crate::value::ValueType;

/// Parse a hex or decimal address string
fn parse_address(address: &str) -> Result<u64> {
    if address.starts_with("0x") || address.starts_with("0X") {
        u64::from_str_radix(&address[2..], 16).context("Invalid hex address")
    } else {
        address.parse::<u64>().context("Invalid address")
    }
}

/// Permission column for a region listing
fn flags(chunk: &MemoryChunk) -> String {
    format!(
        "{}{}{}",
        if chunk.readable { 'r' } else { '-' },
        if chunk.writable { 'w' } else { '-' },
        if chunk.private { 'p' } else { 's' },
    )
}

/// Handle the Regions command
///
/// Lists mapped regions in enumeration order, writable private ones by
/// default.
pub fn regions(pid: i32, all: bool) -> Result<()> {
    let scope = if all { Scope::All } else { Scope::WritablePrivate };
    let chunks = memscan::list_chunks(pid, scope)?;

    println!("{} region(s) for pid {}:", chunks.len(), pid);
    for chunk in &chunks {
        println!(
            "  {:>12x}-{:<12x} {} {:>12}  {}",
            chunk.start,
            chunk.end(),
            flags(chunk),
            chunk.size,
            chunk.backing_name()
        );
    }

    Ok(())
}

/// Handle the Scan command
///
/// Encodes the value and runs a one-shot scan over the target.
pub fn scan(
    pid: i32,
    value_type: ValueType,
    value: &str,
    scope: Option<ScanScope>,
    algorithm: Option<Algorithm>,
    parallel: bool,
    limit: usize,
) -> Result<()> {
    let config = Config::load()?;
    let scope = match scope {
        Some(scope) => scope,
        None => config.scan_scope()?.unwrap_or_default(),
    };
    let algorithm = match algorithm {
        Some(algorithm) => algorithm,
        None => config.scan_algorithm()?.unwrap_or_default(),
    };

    let pattern = value_type.encode(value)?;
    let options = ScanOptions {
        scope,
        algorithm,
        workers: config.workers,
    };

    println!(
        "Scanning pid {} for {} value {} ({} byte pattern, {} scope)...",
        pid,
        value_type,
        value,
        pattern.len(),
        scope
    );

    let started = Instant::now();
    let matches = if parallel {
        memscan::execute_scan_parallel(pid, &pattern, &options)?
    } else {
        memscan::execute_scan(pid, &pattern, &options)?
    };
    let elapsed = started.elapsed().as_secs_f64();
    tracing::debug!("scan took {:.6}s ({} matches)", elapsed, matches.len());

    if matches.is_empty() {
        println!("No matches found ({:.3}s)", elapsed);
        return Ok(());
    }

    println!("Found {} match(es) in {:.3}s:", matches.len(), elapsed);
    let shown = if limit == 0 { matches.len() } else { limit };
    for (i, addr) in matches.iter().take(shown).enumerate() {
        println!("  {}: {:#x}", i + 1, addr);
    }
    if matches.len() > shown {
        println!("  ... and {} more", matches.len() - shown);
    }

    Ok(())
}

/// Handle the Read command
///
/// Reads bytes from the target and displays them as a hex dump.
pub fn read(pid: i32, address: &str, size: usize) -> Result<()> {
    let addr = parse_address(address)?;
    let data = memscan::read_exact_at(pid, addr, size)?;

    println!("Reading {} bytes at {:#x}:", size, addr);
    for (i, chunk) in data.chunks(16).enumerate() {
        print!("{:08x}  ", addr + (i * 16) as u64);
        for (j, byte) in chunk.iter().enumerate() {
            print!("{:02x} ", byte);
            if j == 7 {
                print!(" ");
            }
        }
        // Pad if last line is short
        if chunk.len() < 16 {
            for j in chunk.len()..16 {
                print!("   ");
                if j == 7 {
                    print!(" ");
                }
            }
        }
        print!(" |");
        for byte in chunk {
            let c = *byte as char;
            if c.is_ascii_graphic() || c == ' ' {
                print!("{}", c);
            } else {
                print!(".");
            }
        }
        println!("|");
    }

    Ok(())
}

/// Handle the Write command
///
/// Encodes the value and overwrites target memory at the given address.
pub fn write(pid: i32, address: &str, value_type: ValueType, value: &str) -> Result<()> {
    let addr = parse_address(address)?;
    let pattern = value_type.encode(value)?;

    // Read original bytes first so a mistake can be undone by hand
    let original = memscan::read_exact_at(pid, addr, pattern.len())?;
    print!("Original: ");
    for byte in &original {
        print!("{:02x} ", byte);
    }
    println!(" ({} {})", value_type, value_type.decode(&original));

    memscan::write_at(pid, addr, pattern.bytes())?;
    println!("Write successful!");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_hex() {
        assert_eq!(parse_address("0x1000").unwrap(), 0x1000);
        assert_eq!(parse_address("0X1000").unwrap(), 0x1000);
        assert_eq!(parse_address("0xDEADBEEF").unwrap(), 0xDEADBEEF);
    }

    #[test]
    fn test_parse_address_decimal() {
        assert_eq!(parse_address("4096").unwrap(), 4096);
        assert_eq!(parse_address("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_address_invalid() {
        assert!(parse_address("0xZZZZ").is_err());
        assert!(parse_address("not-an-address").is_err());
        assert!(parse_address("").is_err());
    }

    #[test]
    fn test_flags_column() {
        let chunk = MemoryChunk {
            start: 0x1000,
            size: 0x1000,
            readable: true,
            writable: true,
            private: true,
            name: None,
        };
        assert_eq!(flags(&chunk), "rwp");

        let shared_ro = MemoryChunk {
            readable: true,
            writable: false,
            private: false,
            ..chunk
        };
        assert_eq!(flags(&shared_ro), "r-s");
    }
}
