//! Tierproof Generation Layer
//!
//! Implementations of the generation capability (`GenerationProvider` from
//! `tierproof-domain`) and of raw completion back ends.
//!
//! # Architecture
//!
//! Raw back ends implement [`CompletionProvider`] (prompt in, text out).
//! [`PromptedGenerator`] turns any completion back end into a tier generator
//! by rendering a tier prompt with the assembled context and every
//! accumulated corrective instruction.
//!
//! # Providers
//!
//! - `MockProvider`: prompt-to-response map for testing completion users
//! - `OllamaProvider`: local Ollama API integration
//! - `ExtractiveGenerator`: deterministic offline generator built from source sentences
//! - `ScriptedGenerator`: deterministic per-tier canned outputs for tests
//!
//! # Examples
//!
//! ```
//! use tierproof_llm::{CompletionProvider, MockProvider};
//!
//! # async fn example() {
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.complete("test prompt").await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # }
//! ```

#![warn(missing_docs)]

pub mod extractive;
pub mod generator;
pub mod ollama;
pub mod prompt;
pub mod scripted;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tierproof_domain::{ExtractionError, GenerationError};

pub use extractive::ExtractiveGenerator;
pub use generator::PromptedGenerator;
pub use ollama::OllamaProvider;
pub use prompt::PromptBuilder;
pub use scripted::ScriptedGenerator;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl From<LlmError> for GenerationError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::InvalidResponse(msg) => GenerationError::InvalidOutput(msg),
            other => GenerationError::Backend(other.to_string()),
        }
    }
}

impl From<LlmError> for ExtractionError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::InvalidResponse(msg) => ExtractionError::Parse(msg),
            other => ExtractionError::Backend(other.to_string()),
        }
    }
}

/// Raw prompt-to-text completion back end
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Model name for logs
    fn model(&self) -> &str;

    /// Complete a prompt
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Mock completion provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
///
/// # Examples
///
/// ```
/// use tierproof_llm::{CompletionProvider, MockProvider};
///
/// # async fn example() {
/// let provider = MockProvider::default();
/// provider.add_response("prompt1", "response1");
/// assert_eq!(provider.complete("prompt1").await.unwrap(), "response1");
/// assert_eq!(provider.complete("other").await.unwrap(), "Default mock response");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, Result<String, String>>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&self, prompt: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(prompt.into(), Ok(response.into()));
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&self, prompt: impl Into<String>, message: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(prompt.into(), Err(message.into()));
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner) = 0;
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn model(&self) -> &str {
        "mock"
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner) += 1;

        let responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        match responses.get(prompt) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(message)) => Err(LlmError::Other(message.clone())),
            None => Ok(self.default_response.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        assert_eq!(provider.complete("any prompt").await.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_specific_responses() {
        let provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.complete("hello").await.unwrap(), "world");
        assert_eq!(provider.complete("foo").await.unwrap(), "bar");
        assert_eq!(provider.complete("unknown").await.unwrap(), "Default mock response");
    }

    #[tokio::test]
    async fn test_mock_provider_call_count_shared_between_clones() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.complete("a").await.unwrap();
        provider2.complete("b").await.unwrap();
        assert_eq!(provider1.call_count(), 2);

        provider1.reset_call_count();
        assert_eq!(provider2.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let provider = MockProvider::default();
        provider.add_error("bad prompt", "boom");

        let result = provider.complete("bad prompt").await;
        assert!(matches!(result, Err(LlmError::Other(ref m)) if m == "boom"));
    }

    #[test]
    fn test_error_conversions() {
        let gen: GenerationError = LlmError::InvalidResponse("x".to_string()).into();
        assert_eq!(gen, GenerationError::InvalidOutput("x".to_string()));

        let gen: GenerationError = LlmError::RateLimitExceeded.into();
        assert!(matches!(gen, GenerationError::Backend(_)));

        let ext: ExtractionError = LlmError::InvalidResponse("y".to_string()).into();
        assert_eq!(ext, ExtractionError::Parse("y".to_string()));
    }
}
