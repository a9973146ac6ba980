mod cli;
mod commands;
mod config;
mod value;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memscan=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Interactive { pid, name } => {
            commands::interactive::run(pid, name.as_deref())?;
        }

        Commands::Regions { pid, all } => {
            commands::memory::regions(pid, all)?;
        }

        Commands::Scan {
            pid,
            value_type,
            value,
            scope,
            algorithm,
            parallel,
            limit,
        } => {
            commands::memory::scan(pid, value_type, &value, scope, algorithm, parallel, limit)?;
        }

        Commands::Read { pid, address, size } => {
            commands::memory::read(pid, &address, size)?;
        }

        Commands::Write {
            pid,
            address,
            value_type,
            value,
        } => {
            commands::memory::write(pid, &address, value_type, &value)?;
        }

        Commands::Ps { name } => {
            commands::ps::handle(&name)?;
        }

        Commands::Configure {
            scope,
            algorithm,
            workers,
            show,
        } => {
            commands::configure::handle(scope, algorithm, workers, show)?;
        }
    }

    Ok(())
}
