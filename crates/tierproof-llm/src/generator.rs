//! Adapter from a raw completion back end to the generation capability

use crate::prompt::PromptBuilder;
use crate::CompletionProvider;
use async_trait::async_trait;
use tierproof_domain::{GenerationError, GenerationProvider, GenerationRequest};
use tracing::debug;

/// Generates tier text by prompting a completion back end
pub struct PromptedGenerator<C> {
    completion: C,
}

impl<C: CompletionProvider> PromptedGenerator<C> {
    /// Wrap a completion back end
    pub fn new(completion: C) -> Self {
        Self { completion }
    }

    /// The wrapped back end
    pub fn completion(&self) -> &C {
        &self.completion
    }
}

/// Strip wrappers models like to add around plain text answers
fn clean_output(raw: &str) -> String {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
        .map(|inner| inner.trim_start_matches(|c: char| c.is_alphanumeric()).trim())
        .unwrap_or(trimmed);
    unfenced.trim_matches('"').trim().to_string()
}

#[async_trait]
impl<C: CompletionProvider> GenerationProvider for PromptedGenerator<C> {
    fn name(&self) -> &str {
        self.completion.model()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let prompt = PromptBuilder::new(request).build();
        debug!(
            tier = %request.tier,
            attempt = request.attempt,
            corrections = request.corrections.len(),
            "Prompting {}",
            self.completion.model()
        );

        let raw = self.completion.complete(&prompt).await?;
        let text = clean_output(&raw);
        if text.is_empty() {
            return Err(GenerationError::InvalidOutput("empty completion".to_string()));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;
    use tierproof_domain::{AssembledContext, Tier, WordRange};

    fn request() -> GenerationRequest {
        GenerationRequest {
            tier: Tier::Brief,
            context: AssembledContext {
                tier: Tier::Brief,
                unit_id: "TICK".to_string(),
                unit_name: "Tick Corp".to_string(),
                excerpts: Vec::new(),
                passages: Vec::new(),
                truncated: false,
            },
            corrections: Vec::new(),
            word_range: WordRange::new(10, 15),
            attempt: 1,
        }
    }

    #[test]
    fn test_clean_output() {
        assert_eq!(clean_output("  \"Tick Corp grew.\" "), "Tick Corp grew.");
        assert_eq!(clean_output("```text\nTick Corp grew.\n```"), "Tick Corp grew.");
        assert_eq!(clean_output("plain"), "plain");
    }

    #[tokio::test]
    async fn test_generate_uses_completion() {
        let generator = PromptedGenerator::new(MockProvider::new("Tick Corp reported revenue of $5.2 billion."));
        let text = generator.generate(&request()).await.unwrap();
        assert_eq!(text, "Tick Corp reported revenue of $5.2 billion.");
        assert_eq!(generator.completion().call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_completion_is_error() {
        let generator = PromptedGenerator::new(MockProvider::new("   "));
        let result = generator.generate(&request()).await;
        assert!(matches!(result, Err(GenerationError::InvalidOutput(_))));
    }
}
