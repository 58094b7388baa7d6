//! Error types for the unit pipeline

use thiserror::Error;
use tierproof_domain::{PersistenceError, TransitionError};

/// Errors that end a unit pipeline
///
/// Adapter, generation and extraction failures never surface here; they are
/// recovered inside the unit and recorded on its artifacts.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The unit record could not be persisted
    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    /// A tier artifact was driven through an illegal transition
    #[error("Retry controller error: {0}")]
    Transition(#[from] TransitionError),

    /// A tier task panicked or was aborted
    #[error("Tier task failed: {0}")]
    TierTask(String),
}
