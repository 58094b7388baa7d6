//! Run command implementation.

use crate::app::{build_pipeline, open_store};
use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use tierproof_domain::RunId;
use tierproof_orchestrator::{BatchOrchestrator, BatchReport};
use tierproof_sources::{load_catalogue, resolve_units, UnitEntry};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Execute the run command.
///
/// Fails with [`CliError::ErrorRateExceeded`] when too many units errored;
/// the report is printed first.
pub async fn execute_run(args: RunArgs, config: Config, formatter: &Formatter) -> Result<()> {
    let config = apply_overrides(config, &args)?;
    let Some(report) = run_batch(&args, &config).await? else {
        println!("{}", formatter.warning("No units to process"));
        return Ok(());
    };
    println!("{}", formatter.format_report(&report)?);

    let max = config.orchestrator.max_error_rate;
    if report.error_rate_exceeded(max) {
        return Err(CliError::ErrorRateExceeded {
            rate: report.record.error_rate(),
            max,
        });
    }
    Ok(())
}

/// Fold command-line overrides into the loaded configuration
pub fn apply_overrides(mut config: Config, args: &RunArgs) -> Result<Config> {
    if let Some(concurrency) = args.concurrency {
        config.orchestrator.concurrency = concurrency;
    }
    if let Some(max) = args.max_error_rate {
        config.orchestrator.max_error_rate = max;
    }
    if let Some(dir) = &args.data_dir {
        config.data.fixtures_dir = dir.clone();
    }
    if let Some(database) = &args.database {
        config.data.database = database.clone();
    }
    if args.no_retrieval {
        config.data.retrieval = false;
    }
    config.validate()?;
    Ok(config)
}

/// Run the selected units; `None` when the selection is empty
///
/// Ctrl+C cancels the run: no new unit starts and the rest are skipped.
pub async fn run_batch(args: &RunArgs, config: &Config) -> Result<Option<BatchReport>> {
    if args.units.is_empty() && !args.all {
        return Err(CliError::InvalidInput(
            "Name at least one unit or pass --all".to_string(),
        ));
    }

    let catalogue = if args.all {
        load_catalogue(&config.data.fixtures_dir).await?
    } else {
        // Named units run even without a catalogue; it only supplies names.
        load_catalogue(&config.data.fixtures_dir).await.unwrap_or_else(|e| {
            debug!("No unit catalogue: {}", e);
            Vec::new()
        })
    };
    let entries = select_units(&catalogue, args);
    if entries.is_empty() {
        return Ok(None);
    }

    let store = open_store(config)?;
    let pipeline = build_pipeline(config, store)?;
    let orchestrator = BatchOrchestrator::new(config.orchestrator.clone(), pipeline)?;

    let run_id = RunId::new();
    let units = entries.into_iter().map(|entry| entry.into_unit(run_id)).collect();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; no new units will start");
            trigger.cancel();
        }
    });

    let report = orchestrator.run(run_id, units, cancel).await;
    interrupt.abort();
    Ok(Some(report?))
}

/// Units requested by the arguments, in request (or catalogue) order
fn select_units(catalogue: &[UnitEntry], args: &RunArgs) -> Vec<UnitEntry> {
    let mut entries = if args.all {
        catalogue.to_vec()
    } else {
        resolve_units(catalogue, &args.units)
    };
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["tierproof", "run"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Command::Run(args) => args,
            _ => panic!("Expected Run command"),
        }
    }

    fn catalogue() -> Vec<UnitEntry> {
        ["TICK", "ACME", "ZED"]
            .iter()
            .map(|id| UnitEntry {
                id: id.to_string(),
                name: format!("{} Corp", id),
            })
            .collect()
    }

    #[test]
    fn test_select_all_with_limit() {
        let selected = select_units(&catalogue(), &run_args(&["--all", "--limit", "2"]));
        let ids: Vec<&str> = selected.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["TICK", "ACME"]);
    }

    #[test]
    fn test_select_named_units() {
        let selected = select_units(&catalogue(), &run_args(&["zed", "NEW"]));
        assert_eq!(selected[0].name, "ZED Corp");
        assert_eq!(selected[1].name, "NEW");
    }

    #[tokio::test]
    async fn test_requires_units_or_all() {
        let result = run_batch(&run_args(&[]), &Config::default()).await;
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_overrides_are_validated() {
        let config = apply_overrides(Config::default(), &run_args(&["TICK", "-j", "2", "--no-retrieval"])).unwrap();
        assert_eq!(config.orchestrator.concurrency, 2);
        assert!(!config.data.retrieval);

        let result = apply_overrides(Config::default(), &run_args(&["TICK", "--max-error-rate", "2.0"]));
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
