//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tierproof - Generate and fact-check tiered summaries of financial instruments.
#[derive(Debug, Parser)]
#[command(name = "tierproof")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ~/.tierproof/config.toml)
    #[arg(short, long, global = true, env = "TIERPROOF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `tierproof_pipeline=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (one line per unit)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the pipeline over a batch of units
    Run(RunArgs),

    /// List known units
    Units,

    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Unit identifiers to process
    pub units: Vec<String>,

    /// Process every unit in the catalogue
    #[arg(short, long, conflicts_with = "units")]
    pub all: bool,

    /// Process at most this many units
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Units processed at the same time
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Errored share of attempted units above which the run fails (0.0-1.0)
    #[arg(long)]
    pub max_error_rate: Option<f64>,

    /// Override the fixtures directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Override the SQLite database path
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Skip passage retrieval
    #[arg(long)]
    pub no_retrieval: bool,
}

/// Arguments for the config command.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    /// Print the configuration file path instead
    #[arg(long)]
    pub path: bool,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from(["tierproof", "run", "TICK", "ACME", "-j", "3", "--max-error-rate", "0.2"]);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.units, vec!["TICK", "ACME"]);
                assert_eq!(args.concurrency, Some(3));
                assert_eq!(args.max_error_rate, Some(0.2));
                assert!(!args.all);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_all_with_limit() {
        let cli = Cli::parse_from(["tierproof", "--format", "json", "run", "--all", "--limit", "10"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        match cli.command {
            Command::Run(args) => {
                assert!(args.all);
                assert_eq!(args.limit, Some(10));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_all_conflicts_with_unit_list() {
        assert!(Cli::try_parse_from(["tierproof", "run", "--all", "TICK"]).is_err());
    }

    #[test]
    fn test_config_command() {
        let cli = Cli::parse_from(["tierproof", "config", "--path"]);
        assert!(matches!(cli.command, Command::Config(ConfigArgs { path: true })));
    }
}
