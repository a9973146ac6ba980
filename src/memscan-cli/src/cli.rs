//! Command-line interface definitions

use clap::{Parser, Subcommand};

use memscan::{Algorithm, ScanScope};

use crate::value::ValueType;

#[derive(Parser)]
#[command(name = "memscan", version, about = "Scan and edit the memory of a running process", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive session: search a value, narrow the matches as it
    /// changes, then overwrite it
    #[command(visible_alias = "i")]
    Interactive {
        /// Pid of the target process
        pid: Option<i32>,

        /// Find the target by process name instead of pid
        #[arg(short, long, conflicts_with = "pid")]
        name: Option<String>,
    },

    /// List the mapped memory regions of a process
    #[command(visible_alias = "maps")]
    Regions {
        /// Pid of the target process
        pid: i32,

        /// Show every mapping, not just writable private ones
        #[arg(short, long)]
        all: bool,
    },

    /// One-shot scan for a typed value
    Scan {
        /// Pid of the target process
        pid: i32,

        /// The value to search for
        value: String,

        /// How to encode the value
        #[arg(short = 't', long = "type", value_enum, default_value_t = ValueType::I32)]
        value_type: ValueType,

        /// Regions to cover (program, writable, all)
        #[arg(long)]
        scope: Option<ScanScope>,

        /// Search algorithm (standard, boyer-moore)
        #[arg(long)]
        algorithm: Option<Algorithm>,

        /// Scan with one worker per allowed core
        #[arg(short, long)]
        parallel: bool,

        /// Maximum number of addresses to show (0 = all)
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Read raw bytes at an address and show a hex dump
    Read {
        /// Pid of the target process
        pid: i32,

        /// Address to read (hex with 0x prefix, or decimal)
        address: String,

        /// Number of bytes to read
        #[arg(short, long, default_value = "64")]
        size: usize,
    },

    /// Write a typed value at an address
    Write {
        /// Pid of the target process
        pid: i32,

        /// Address to write (hex with 0x prefix, or decimal)
        address: String,

        /// The value to write
        value: String,

        /// How to encode the value
        #[arg(short = 't', long = "type", value_enum, default_value_t = ValueType::I32)]
        value_type: ValueType,
    },

    /// Find pids by process name
    Ps {
        /// Substring to match against process names
        name: String,
    },

    /// Show or change persistent defaults
    #[command(visible_alias = "config")]
    Configure {
        /// Default region scope for scans (program, writable, all)
        #[arg(long)]
        scope: Option<ScanScope>,

        /// Default search algorithm (standard, boyer-moore)
        #[arg(long)]
        algorithm: Option<Algorithm>,

        /// Fixed parallel worker count (must match the allowed cores)
        #[arg(long)]
        workers: Option<usize>,

        /// Show the current configuration
        #[arg(long)]
        show: bool,
    },
}
