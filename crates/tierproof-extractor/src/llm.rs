//! LLM-backed claim extraction

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::parse_llm_response;
use async_trait::async_trait;
use tierproof_domain::{Claim, ClaimExtractor, ExtractionError};
use tierproof_llm::CompletionProvider;
use tokio::time::timeout;
use tracing::{debug, info};

/// Extracts claims by prompting a completion back end for JSON
pub struct LlmClaimExtractor<C> {
    completion: C,
    config: ExtractorConfig,
}

impl<C: CompletionProvider> LlmClaimExtractor<C> {
    /// Create an extractor over a completion back end
    pub fn new(completion: C, config: ExtractorConfig) -> Self {
        Self { completion, config }
    }

    /// Build the extraction prompt for a candidate text
    pub fn build_prompt(text: &str) -> String {
        let mut prompt = String::new();
        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\nText to analyze:\n---\n");
        prompt.push_str(text);
        prompt.push_str("\n---\n\n");
        prompt.push_str(OUTPUT_FORMAT_REMINDER);
        prompt
    }

    /// Extract claims, returning the crate error
    pub async fn extract_claims(&self, text: &str) -> Result<Vec<Claim>, ExtractorError> {
        let length = text.chars().count();
        if length > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(length, self.config.max_text_length));
        }

        let prompt = Self::build_prompt(text);
        debug!("Prompt length: {} chars", prompt.len());

        let response = timeout(self.config.extraction_timeout(), self.completion.complete(&prompt))
            .await
            .map_err(|_| ExtractorError::Timeout(self.config.extraction_timeout_secs))??;

        let claims = parse_llm_response(&response)?;
        info!(model = self.completion.model(), "Parsed {} claims", claims.len());
        Ok(claims)
    }
}

#[async_trait]
impl<C: CompletionProvider> ClaimExtractor for LlmClaimExtractor<C> {
    async fn extract(&self, text: &str) -> Result<Vec<Claim>, ExtractionError> {
        Ok(self.extract_claims(text).await?)
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"Split the text below into atomic claims. Each claim asserts exactly one checkable fact about a financial instrument.

Claim kinds:
- "numeric": a number, currency amount or percentage. "value" is the number (scaled: $5.2 billion is 5200000000), "unit" is "currency", "percent" or "plain".
- "date": a calendar date. "value" is "YYYY-MM-DD".
- "attribution": a named firm, person or rating label. "value" is the name as written.
- "event": any other factual statement. Omit "value".

For every claim give "text" (the clause the fact comes from) and "subject" (the words labelling the value, e.g. "price target"). Optionally give "provider" when the text names the source type ("filings", "analyst", "news").

Do not invent facts. Opinions and hedged language without a checkable fact are not claims."#;

const OUTPUT_FORMAT_REMINDER: &str = "Respond with only a JSON array of claim objects. Respond with [] when the text has no checkable claims.";

#[cfg(test)]
mod tests {
    use super::*;
    use tierproof_llm::MockProvider;

    const TEXT: &str = "Morgan Stanley reiterated a Buy rating with a price target of $195.";

    #[tokio::test]
    async fn test_extract_via_completion() {
        let provider = MockProvider::default();
        provider.add_response(
            LlmClaimExtractor::<MockProvider>::build_prompt(TEXT),
            r#"[{"text": "a price target of $195", "kind": "numeric", "subject": "price target", "value": 195, "unit": "currency"}]"#,
        );
        let extractor = LlmClaimExtractor::new(provider.clone(), ExtractorConfig::default());

        let claims = extractor.extract(TEXT).await.unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].value_display(), "$195");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_maps_to_extraction_error() {
        let provider = MockProvider::default();
        provider.add_error(LlmClaimExtractor::<MockProvider>::build_prompt(TEXT), "down");
        let extractor = LlmClaimExtractor::new(provider, ExtractorConfig::default());

        let result = extractor.extract(TEXT).await;
        assert!(matches!(result, Err(ExtractionError::Backend(_))));
    }

    #[tokio::test]
    async fn test_unparseable_response() {
        let extractor = LlmClaimExtractor::new(MockProvider::new("no claims here"), ExtractorConfig::default());
        let result = extractor.extract(TEXT).await;
        assert!(matches!(result, Err(ExtractionError::Parse(_))));
    }

    #[tokio::test]
    async fn test_text_too_long_skips_backend() {
        let provider = MockProvider::default();
        let config = ExtractorConfig {
            max_text_length: 10,
            ..ExtractorConfig::default()
        };
        let extractor = LlmClaimExtractor::new(provider.clone(), config);

        let result = extractor.extract(TEXT).await;
        assert!(matches!(result, Err(ExtractionError::InvalidInput(_))));
        assert_eq!(provider.call_count(), 0);
    }
}
