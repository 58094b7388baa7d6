//! Tierproof CLI library.
//!
//! This library provides the core functionality for the `tierproof`
//! command-line interface: configuration loading, wiring of the batch run,
//! command execution and report formatting.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
