//! Error types for claim extraction

use thiserror::Error;
use tierproof_domain::ExtractionError;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] tierproof_llm::LlmError),

    /// Text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// Extraction timeout
    #[error("Extraction timeout after {0} s")]
    Timeout(u64),

    /// Invalid claim format in LLM response
    #[error("Invalid claim format: {0}")]
    InvalidFormat(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}

impl From<ExtractorError> for ExtractionError {
    fn from(err: ExtractorError) -> Self {
        match err {
            ExtractorError::Llm(e) => e.into(),
            ExtractorError::TextTooLong(..) => ExtractionError::InvalidInput(err.to_string()),
            ExtractorError::Timeout(secs) => ExtractionError::Timeout(secs * 1000),
            ExtractorError::InvalidFormat(msg) | ExtractorError::JsonParse(msg) => ExtractionError::Parse(msg),
        }
    }
}
