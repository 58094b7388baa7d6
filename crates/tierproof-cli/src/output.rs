//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};
use tierproof_domain::{BatchRunRecord, Tier, TierStatus, TierSummary, UnitOutcome, UnitStatus};
use tierproof_orchestrator::BatchReport;
use tierproof_sources::UnitEntry;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a finished batch run.
    pub fn format_report(&self, report: &BatchReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&report.record)?),
            OutputFormat::Table => Ok(self.format_report_table(report)),
            OutputFormat::Quiet => Ok(report
                .record
                .outcomes
                .iter()
                .map(|o| format!("{}\t{}", o.unit_id, o.status.as_str()))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_report_table(&self, report: &BatchReport) -> String {
        let record = &report.record;
        let mut out = Vec::new();

        if record.outcomes.is_empty() {
            out.push(self.colorize("No units processed.", "yellow"));
        } else {
            let mut builder = Builder::default();
            builder.push_record(["Unit", "Status", "Attempts", "Brief", "Medium", "Expanded"]);
            for outcome in &record.outcomes {
                let tiers = Tier::ALL.map(|tier| {
                    outcome
                        .tiers
                        .iter()
                        .find(|t| t.tier == tier)
                        .map(tier_cell)
                        .unwrap_or_else(|| "-".to_string())
                });
                builder.push_record([
                    outcome.unit_id.clone(),
                    outcome.status.as_str().to_string(),
                    outcome.attempts.to_string(),
                    tiers[0].clone(),
                    tiers[1].clone(),
                    tiers[2].clone(),
                ]);
            }

            let mut table = builder.build();
            table
                .with(Style::rounded())
                .with(Modify::new(Rows::first()).with(Alignment::center()));
            out.push(table.to_string());
        }

        out.push(self.run_summary(record));
        for outcome in record.failures() {
            out.push(format!("  {} [{}]: {}", outcome.unit_id, outcome.status.as_str(), failure_reason(outcome)));
        }
        if record.cancelled {
            out.push(self.warning(&format!("Run cancelled; {} unit(s) skipped", record.skipped)));
        }
        if report.vacuous_alarm {
            out.push(self.warning(&format!(
                "{} of verified tiers passed with zero claims; check claim extraction",
                percent(report.metrics.vacuous_rate())
            )));
        }
        out.join("\n")
    }

    fn run_summary(&self, record: &BatchRunRecord) -> String {
        let line = format!(
            "Run {}: {} unit(s), {} passed, {} partially failed, {} errored, {} skipped ({} attempts)",
            record.run_id,
            record.total_units,
            record.passed,
            record.partially_failed,
            record.errored,
            record.skipped,
            record.total_attempts
        );
        if record.errored > 0 {
            self.error(&line)
        } else if record.partially_failed > 0 || record.skipped > 0 {
            self.warning(&line)
        } else {
            self.success(&line)
        }
    }

    /// Format the unit catalogue.
    pub fn format_units(&self, units: &[UnitEntry]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(units)?),
            OutputFormat::Quiet => Ok(units.iter().map(|u| u.id.as_str()).collect::<Vec<_>>().join("\n")),
            OutputFormat::Table => {
                if units.is_empty() {
                    return Ok(self.colorize("No units found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["ID", "Name"]);
                for unit in units {
                    builder.push_record([unit.id.as_str(), unit.name.as_str()]);
                }
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// One tier's table cell, e.g. `passed ×1 100%` or `exhausted ×5 83% !`
fn tier_cell(summary: &TierSummary) -> String {
    let mut cell = format!("{} ×{}", summary.status.as_str(), summary.attempts);
    if summary.vacuous {
        cell.push_str(" vacuous");
    } else if let Some(rate) = summary.pass_rate {
        cell.push(' ');
        cell.push_str(&percent(rate));
    }
    if summary.needs_review {
        cell.push_str(" !");
    }
    cell
}

fn failure_reason(outcome: &UnitOutcome) -> String {
    if outcome.status == UnitStatus::Errored {
        return outcome.error.clone().unwrap_or_else(|| "unknown error".to_string());
    }
    let exhausted: Vec<&str> = outcome
        .tiers
        .iter()
        .filter(|t| t.status == TierStatus::Exhausted)
        .map(|t| t.tier.as_str())
        .collect();
    match &outcome.error {
        Some(error) => format!("exhausted {}; last error: {}", exhausted.join(", "), error),
        None => format!("exhausted {}", exhausted.join(", ")),
    }
}

fn percent(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}
