//! Process listing command handlers

use anyhow::{bail, Result};
use sysinfo::System;

/// Handle the ps command
///
/// Lists running processes whose name contains the given substring.
pub fn handle(name: &str) -> Result<()> {
    let found = find_processes(name);

    if found.is_empty() {
        println!("No process matching {:?}", name);
        return Ok(());
    }

    println!("{:>8}  {:>10}  NAME", "PID", "MEMORY");
    for (pid, memory, pname) in &found {
        println!("{:>8}  {:>7} MB  {}", pid, memory / 1_000_000, pname);
    }

    Ok(())
}

/// Find processes whose name contains `name`, largest resident set first
pub fn find_processes(name: &str) -> Vec<(i32, u64, String)> {
    let mut system = System::new_all();
    system.refresh_all();

    let needle = name.to_lowercase();
    let mut found: Vec<(i32, u64, String)> = Vec::new();

    for process in system.processes().values() {
        let pname = process.name().to_string_lossy().into_owned();
        if pname.to_lowercase().contains(&needle) {
            found.push((process.pid().as_u32() as i32, process.memory(), pname));
        }
    }

    found.sort_by(|a, b| b.1.cmp(&a.1));
    found
}

/// Resolve a process name to a single pid.
///
/// When several processes match, the one using the most memory wins, on
/// the assumption that the interesting target is the big one.
pub fn resolve_name(name: &str) -> Result<i32> {
    let found = find_processes(name);

    match found.first() {
        Some((pid, memory, pname)) => {
            eprintln!(
                "Found process {:?}: pid {} (memory: {} MB)",
                pname,
                pid,
                memory / 1_000_000
            );
            Ok(*pid)
        }
        None => bail!("No process matching {:?}. Is it running?", name),
    }
}
