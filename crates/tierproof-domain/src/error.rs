//! Errors carried across the domain trait seams

use thiserror::Error;

/// A source adapter could not produce documents
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The provider has no data for this unit
    #[error("No data for unit {0}")]
    NotFound(String),

    /// Transport or I/O failure
    #[error("Adapter I/O error: {0}")]
    Io(String),

    /// The provider returned data that could not be normalized
    #[error("Malformed provider data: {0}")]
    Malformed(String),

    /// The call exceeded its deadline
    #[error("Adapter call timed out after {0} ms")]
    Timeout(u64),
}

/// The generation capability failed to produce text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The back end could not be reached or returned an error
    #[error("Generation back end error: {0}")]
    Backend(String),

    /// The back end answered with unusable output
    #[error("Invalid generation output: {0}")]
    InvalidOutput(String),

    /// The call exceeded its deadline
    #[error("Generation timed out after {0} ms")]
    Timeout(u64),
}

/// Claim extraction failed outright
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Input rejected before extraction
    #[error("Invalid extraction input: {0}")]
    InvalidInput(String),

    /// The extraction back end failed
    #[error("Extraction back end error: {0}")]
    Backend(String),

    /// The extraction back end answered with unparseable output
    #[error("Unparseable extraction output: {0}")]
    Parse(String),

    /// The call exceeded its deadline
    #[error("Extraction timed out after {0} ms")]
    Timeout(u64),
}

/// The persistence sink could not store a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Storage back end failure; nothing was written
    #[error("Storage error: {0}")]
    Storage(String),

    /// The record could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A record with the same key already exists
    #[error("Duplicate record: {0}")]
    Duplicate(String),
}
