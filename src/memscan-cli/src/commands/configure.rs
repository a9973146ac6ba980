//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up memscan defaults.

use anyhow::Result;
use memscan::{Algorithm, ScanScope};

use crate::config::Config;

/// Handle the configure command
///
/// # Arguments
/// * `scope` - Optional default region scope for scans
/// * `algorithm` - Optional default search algorithm
/// * `workers` - Optional fixed parallel worker count
/// * `show` - If true, show current configuration
pub fn handle(
    scope: Option<ScanScope>,
    algorithm: Option<Algorithm>,
    workers: Option<usize>,
    show: bool,
) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config)?;
        return Ok(());
    }

    if scope.is_none() && algorithm.is_none() && workers.is_none() {
        show_usage();
        return Ok(());
    }

    set_values(&mut config, scope, algorithm, workers)
}

/// Display current configuration
fn show_config(config: &Config) -> Result<()> {
    match config.scan_scope()? {
        Some(scope) => println!("Scope: {}", scope),
        None => println!("Scope: program (default)"),
    }

    match config.scan_algorithm()? {
        Some(algorithm) => println!("Algorithm: {}", algorithm),
        None => println!("Algorithm: standard (default)"),
    }

    match config.workers {
        Some(workers) => println!("Workers: {}", workers),
        None => println!("Workers: one per allowed core"),
    }

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }

    Ok(())
}

/// Apply the requested settings and save
fn set_values(
    config: &mut Config,
    scope: Option<ScanScope>,
    algorithm: Option<Algorithm>,
    workers: Option<usize>,
) -> Result<()> {
    if let Some(scope) = scope {
        config.set_scope(scope);
        println!("Default scope: {}", scope);
    }

    if let Some(algorithm) = algorithm {
        config.set_algorithm(algorithm);
        println!("Default algorithm: {}", algorithm);
    }

    if let Some(workers) = workers {
        config.set_workers(workers);
        println!("Parallel workers: {}", workers);
    }

    config.save()?;
    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: memscan configure --scope <program|writable|all>");
    println!("   or: memscan configure --algorithm <standard|boyer-moore>");
    println!("   or: memscan configure --workers <count>");
    println!("   or: memscan configure --show");
    println!();
    println!("Note: a configured worker count must match the number of cores");
    println!("      this process may run on, or parallel scans will fail.");
}
