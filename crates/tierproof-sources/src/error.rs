//! Error types for source loading

use std::path::PathBuf;
use thiserror::Error;
use tierproof_domain::AdapterError;

/// Errors that can occur while reading source data
#[derive(Error, Debug)]
pub enum SourceError {
    /// File is missing
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    /// File could not be read
    #[error("I/O error reading {path}: {message}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        message: String,
    },

    /// File content is not the expected JSON shape
    #[error("Malformed {path}: {message}")]
    Malformed {
        /// File being parsed
        path: PathBuf,
        /// Parser message
        message: String,
    },
}

impl SourceError {
    pub(crate) fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            SourceError::NotFound(path)
        } else {
            SourceError::Io {
                path,
                message: err.to_string(),
            }
        }
    }
}

impl From<SourceError> for AdapterError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(path) => AdapterError::NotFound(path.display().to_string()),
            SourceError::Io { .. } => AdapterError::Io(err.to_string()),
            SourceError::Malformed { .. } => AdapterError::Malformed(err.to_string()),
        }
    }
}

/// Read and parse a JSON file
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(path: PathBuf) -> Result<T, SourceError> {
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| SourceError::from_io(path.clone(), e))?;
    serde_json::from_str(&raw).map_err(|e| SourceError::Malformed {
        path,
        message: e.to_string(),
    })
}
