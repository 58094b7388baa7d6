//! Batch orchestrator: many unit pipelines under one concurrency gate

use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tierproof_domain::{BatchRunRecord, PersistenceSink, RunId, Unit, UnitOutcome, UnitStatus};
use tierproof_pipeline::UnitPipeline;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::metrics::BatchMetrics;

/// Result of a finished batch run
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// The persisted run record
    pub record: BatchRunRecord,
    /// Counters gathered while the run progressed
    pub metrics: BatchMetrics,
    /// Whether the zero-claim alarm fired
    pub vacuous_alarm: bool,
}

impl BatchReport {
    /// Whether the errored share of attempted units is above `max`
    pub fn error_rate_exceeded(&self, max: f64) -> bool {
        self.record.error_rate() > max
    }
}

/// Runs unit pipelines concurrently and keeps the batch audit record
///
/// At most `concurrency` units are in flight. Every unit failure, panics
/// included, is contained to that unit and recorded as `errored`.
pub struct BatchOrchestrator {
    config: OrchestratorConfig,
    pipeline: UnitPipeline,
    sink: Arc<dyn PersistenceSink>,
}

impl BatchOrchestrator {
    /// Create an orchestrator; the run record goes to the pipeline's sink
    pub fn new(config: OrchestratorConfig, pipeline: UnitPipeline) -> Result<Self, OrchestratorError> {
        config.validate().map_err(OrchestratorError::Config)?;
        let sink = pipeline.sink();
        Ok(Self { config, pipeline, sink })
    }

    /// The active configuration
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run every unit and persist exactly one run record
    ///
    /// Duplicate unit ids are processed once. After `cancel` fires no new
    /// unit starts; units already in flight finish and the rest are
    /// recorded as skipped. The record is marked cancelled whenever the
    /// token fired before the run finished.
    ///
    /// # Errors
    ///
    /// Only run-fatal conditions: the gate closing or the run record write
    /// failing.
    pub async fn run(
        &self,
        run_id: RunId,
        units: Vec<Unit>,
        cancel: CancellationToken,
    ) -> Result<BatchReport, OrchestratorError> {
        let started = Instant::now();
        let units = dedupe(units);
        let span = info_span!("batch", run_id = %run_id, units = units.len());
        self.execute(run_id, units, cancel, started).instrument(span).await
    }

    async fn execute(
        &self,
        run_id: RunId,
        units: Vec<Unit>,
        cancel: CancellationToken,
        started: Instant,
    ) -> Result<BatchReport, OrchestratorError> {
        info!(concurrency = self.config.concurrency, "Batch run started");

        let gate = Arc::new(Semaphore::new(self.config.concurrency));
        let mut record = BatchRunRecord::new(run_id, units.len());
        let mut metrics = BatchMetrics::new();
        let mut set = JoinSet::new();
        let mut in_flight = HashSet::new();
        let mut cancelled = false;

        let mut pending = units.into_iter();
        for unit in pending.by_ref() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&gate).acquire_owned() => {
                    Some(permit.map_err(|e| OrchestratorError::Gate(e.to_string()))?)
                }
            };
            let Some(permit) = permit else {
                cancelled = true;
                let outcome = UnitOutcome::skipped(&unit.id);
                metrics.record_unit(&outcome);
                record.record(outcome);
                break;
            };

            debug!(unit_id = %unit.id, "Unit started");
            in_flight.insert(unit.id.clone());
            let pipeline = self.pipeline.clone();
            set.spawn(
                async move {
                    let _permit = permit;
                    let unit_id = unit.id.clone();
                    let result = AssertUnwindSafe(pipeline.run(unit)).catch_unwind().await;
                    match result {
                        Ok(Ok(unit_record)) => unit_record.outcome(),
                        Ok(Err(e)) => UnitOutcome::errored(&unit_id, e.to_string()),
                        Err(payload) => {
                            UnitOutcome::errored(&unit_id, format!("Unit pipeline panicked: {}", panic_message(&*payload)))
                        }
                    }
                }
                .in_current_span(),
            );
        }

        for unit in pending {
            let outcome = UnitOutcome::skipped(&unit.id);
            metrics.record_unit(&outcome);
            record.record(outcome);
        }
        if cancelled {
            warn!(skipped = record.skipped, "Batch cancelled; waiting for units in flight");
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(outcome) => {
                    in_flight.remove(&outcome.unit_id);
                    if outcome.status == UnitStatus::Errored {
                        error!(
                            unit_id = %outcome.unit_id,
                            error = outcome.error.as_deref().unwrap_or_default(),
                            "Unit errored"
                        );
                    }
                    metrics.record_unit(&outcome);
                    record.record(outcome);
                }
                Err(e) => error!(error = %e, "Unit task failed"),
            }
        }

        // Tasks that ended without reporting back
        let mut lost: Vec<String> = in_flight.into_iter().collect();
        lost.sort();
        for unit_id in lost {
            let outcome = UnitOutcome::errored(unit_id, "unit task ended without an outcome");
            metrics.record_unit(&outcome);
            record.record(outcome);
        }

        // Cancellation can land after the last unit was admitted
        let cancelled = cancelled || cancel.is_cancelled();
        let record = record.finalize(cancelled);
        self.sink.store_run(&record).await?;

        metrics.total_runtime_ms = started.elapsed().as_millis() as u64;
        let vacuous_alarm = metrics.vacuous_alarm(self.config.vacuous_alarm_ratio);
        if vacuous_alarm {
            warn!(
                vacuous = metrics.total_vacuous(),
                rate = metrics.vacuous_rate(),
                "Zero-claim pass rate is above the alarm ratio; check the claim extractor"
            );
        }
        info!(
            passed = record.passed,
            partially_failed = record.partially_failed,
            errored = record.errored,
            skipped = record.skipped,
            attempts = record.total_attempts,
            "Batch run finished"
        );
        debug!("Batch metrics:\n{}", metrics.summary());

        Ok(BatchReport {
            record,
            metrics,
            vacuous_alarm,
        })
    }
}

/// Keep the first occurrence of every unit id
fn dedupe(units: Vec<Unit>) -> Vec<Unit> {
    let mut seen = HashSet::new();
    units
        .into_iter()
        .filter(|unit| {
            let fresh = seen.insert(unit.id.clone());
            if !fresh {
                warn!(unit_id = %unit.id, "Duplicate unit ignored");
            }
            fresh
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
