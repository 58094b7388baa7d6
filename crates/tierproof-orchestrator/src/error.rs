//! Error types for batch runs

use thiserror::Error;
use tierproof_domain::PersistenceError;

/// Conditions that end a whole batch run
///
/// Failures of single units are never reported here; they land in the run
/// record as `errored` outcomes.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The concurrency gate could not be acquired
    #[error("Concurrency gate error: {0}")]
    Gate(String),

    /// The final run record could not be written
    #[error("Failed to persist run record: {0}")]
    RunRecord(#[from] PersistenceError),
}
