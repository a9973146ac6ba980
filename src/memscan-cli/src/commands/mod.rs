//! Command handlers for the memscan CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod configure;
pub mod interactive;
pub mod memory;
pub mod ps;
