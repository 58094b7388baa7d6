//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Source data error
    #[error("Source data error: {0}")]
    Source(#[from] tierproof_sources::SourceError),

    /// Database error
    #[error("Store error: {0}")]
    Store(#[from] tierproof_store::StoreError),

    /// Pipeline setup error
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] tierproof_pipeline::PipelineError),

    /// Run-fatal orchestrator error
    #[error("Batch run failed: {0}")]
    Orchestrator(#[from] tierproof_orchestrator::OrchestratorError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Too many units errored
    #[error("Error rate {rate:.2} exceeds the maximum of {max:.2}")]
    ErrorRateExceeded {
        /// Errored share of attempted units
        rate: f64,
        /// Configured maximum
        max: f64,
    },
}

impl CliError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::ErrorRateExceeded { .. } => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::ErrorRateExceeded { rate: 0.5, max: 0.1 }.exit_code(), 2);
        assert_eq!(CliError::InvalidInput("x".to_string()).exit_code(), 1);
        assert_eq!(
            CliError::ErrorRateExceeded { rate: 0.5, max: 0.1 }.to_string(),
            "Error rate 0.50 exceeds the maximum of 0.10"
        );
    }
}
