//! Tierproof Batch Orchestrator
//!
//! Drives many unit pipelines concurrently and keeps the single audit record
//! of the batch run.
//!
//! # Overview
//!
//! - **Concurrency gate**: a counting semaphore caps units in flight
//! - **Failure isolation**: an errored or panicking unit is recorded as
//!   `errored`; the batch continues
//! - **Cancellation**: a [`CancellationToken`](tokio_util::sync::CancellationToken)
//!   stops new units from starting; units never started are `skipped`
//! - **Run record**: finalized and persisted exactly once per run
//! - **Metrics**: per-tier counters and the zero-claim pass alarm
//!
//! # Usage
//!
//! ```no_run
//! use tierproof_orchestrator::{BatchOrchestrator, OrchestratorConfig};
//! use tierproof_pipeline::UnitPipeline;
//! use tierproof_domain::{RunId, Unit};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(pipeline: UnitPipeline) -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = BatchOrchestrator::new(OrchestratorConfig::default(), pipeline)?;
//! let run_id = RunId::new();
//! let units = vec![Unit::new("TICK", "Tick Corp", run_id)];
//!
//! let report = orchestrator.run(run_id, units, CancellationToken::new()).await?;
//! println!("{}", report.metrics.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod metrics;
mod orchestrator;

pub use config::OrchestratorConfig;
pub use error::OrchestratorError;
pub use metrics::BatchMetrics;
pub use orchestrator::{BatchOrchestrator, BatchReport};
