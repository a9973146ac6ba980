//! Interactive scan session
//!
//! The classic scan loop: pick a value type, search for the current
//! value, narrow the matches as the value changes in the target, then
//! overwrite the surviving addresses.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use memscan::{Pattern, ScanOptions};

use crate::commands::ps;
use crate::config::Config;
use crate::value::ValueType;

/// Handle the interactive command
pub fn run(pid: Option<i32>, name: Option<&str>) -> Result<()> {
    let pid = match (pid, name) {
        (Some(pid), _) => pid,
        (None, Some(name)) => ps::resolve_name(name)?,
        (None, None) => bail!("Provide a pid or --name. See 'memscan interactive --help'"),
    };

    memscan::pid_exists(pid).with_context(|| format!("Cannot attach to pid {}", pid))?;

    let config = Config::load()?;
    let options = ScanOptions {
        scope: config.scan_scope()?.unwrap_or_default(),
        algorithm: config.scan_algorithm()?.unwrap_or_default(),
        workers: config.workers,
    };
    tracing::debug!(
        "session for pid {} ({} scope, {} search)",
        pid,
        options.scope,
        options.algorithm
    );

    let stdin = io::stdin();
    let mut input = stdin.lock();
    session(pid, &options, &mut input)
}

/// One full session: repeated scan/narrow/write rounds until the user
/// quits.
fn session(pid: i32, options: &ScanOptions, input: &mut impl BufRead) -> Result<()> {
    loop {
        let value_type = ask_type(input)?;

        prompt("Please, select the value to search: ")?;
        let pattern = ask_value(value_type, input)?;

        println!("Please wait...\n");
        let started = Instant::now();
        let mut matches = memscan::execute_scan(pid, &pattern, options)?;
        println!("ELAPSED TIME: {:.6}", started.elapsed().as_secs_f64());

        if matches.is_empty() {
            println!("No matches found");
        } else {
            println!("{} address<es> matching the value", matches.len());

            let mut narrowed_out = false;
            if ask_yes_no("Do you want to filter the matches? (0: no; 1: yes): ", input)? {
                loop {
                    prompt("\nPlease, select the value to search: ")?;
                    let pattern = ask_value(value_type, input)?;

                    println!("Please wait...\n");
                    let started = Instant::now();
                    matches = memscan::narrow(pid, &matches, &pattern)?;
                    println!("ELAPSED TIME: {:.6}", started.elapsed().as_secs_f64());

                    if matches.is_empty() {
                        println!("No matches found");
                        narrowed_out = true;
                        break;
                    }
                    println!("{} address<es> matching the value", matches.len());

                    if !ask_yes_no("Do you want to filter the matches? (0: no; 1: yes): ", input)? {
                        break;
                    }
                }
            }

            if !narrowed_out {
                for addr in &matches {
                    println!("Address: {:#x}", addr);
                }

                prompt("\nPlease, enter the value for the new address<es>: ")?;
                let replacement = ask_value(value_type, input)?;

                println!("Please wait...\n");
                let outcome = memscan::apply(pid, &matches, &replacement);
                if outcome.all_ok() {
                    println!("Value<s> modified\n");
                } else {
                    println!(
                        "{} value<s> modified, {} address<es> failed:",
                        outcome.written,
                        outcome.failures.len()
                    );
                    for (addr, err) in &outcome.failures {
                        println!("  {:#x}: {}", addr, err);
                    }
                    println!();
                }
            }
        }

        if !ask_yes_no("Do you want to scan more values? (0: no; 1: yes): ", input)? {
            return Ok(());
        }
    }
}

/// Print a prompt without a trailing newline
fn prompt(text: &str) -> Result<()> {
    print!("{}", text);
    io::stdout().flush()?;
    Ok(())
}

/// Read one line, failing on end of input
fn read_line(input: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("Unexpected end of input");
    }
    Ok(line)
}

/// Show the type menu and prompt until a valid choice comes back
fn ask_type(input: &mut impl BufRead) -> Result<ValueType> {
    println!("Available data types:");
    println!();
    for (i, ty) in ValueType::ALL.iter().enumerate() {
        println!("{}) {}", i + 1, ty.label());
    }
    prompt("Please, select the value type: ")?;

    loop {
        let line = read_line(input)?;
        match line.trim().parse::<usize>() {
            Ok(choice) if (1..=ValueType::ALL.len()).contains(&choice) => {
                let ty = ValueType::ALL[choice - 1];
                println!("Type selected: {}\n", ty.name());
                return Ok(ty);
            }
            _ => {
                prompt("Please, select a correct value type (choice between 1 and 7): ")?;
            }
        }
    }
}

/// Prompt until the input encodes as the selected type
fn ask_value(value_type: ValueType, input: &mut impl BufRead) -> Result<Pattern> {
    loop {
        let line = read_line(input)?;
        let trimmed = line.trim_end_matches('\n').trim_end_matches('\r');

        match value_type.encode(trimmed) {
            Ok(pattern) => {
                if value_type != ValueType::Str {
                    println!("Selected value: {}\n", value_type.decode(pattern.bytes()));
                }
                return Ok(pattern);
            }
            Err(err) => {
                prompt(&format!("{}. Provide a correct value: ", err))?;
            }
        }
    }
}

/// Prompt for a 0/1 answer until one comes back
fn ask_yes_no(question: &str, input: &mut impl BufRead) -> Result<bool> {
    prompt(question)?;
    loop {
        let line = read_line(input)?;
        match line.trim() {
            "0" => return Ok(false),
            "1" => return Ok(true),
            _ => {
                prompt("\nPlease, select a valid choice (1 for YES, 0 for NO): ")?;
            }
        }
    }
}
