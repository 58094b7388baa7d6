//! Deterministic offline generator
//!
//! Builds a tier from sentences already present in the source excerpts, so
//! every statement it makes is backed by a source by construction. Used when
//! no model back end is configured.

use async_trait::async_trait;
use tierproof_domain::text::{split_sentences, word_count};
use tierproof_domain::{GenerationError, GenerationProvider, GenerationRequest};

/// Composes tier text from source sentences until the word range is met
#[derive(Debug, Clone, Default)]
pub struct ExtractiveGenerator;

impl ExtractiveGenerator {
    /// Create a new generator
    pub fn new() -> Self {
        Self
    }
}

/// Sentences per excerpt, interleaved so every provider contributes early
fn interleaved_sentences(request: &GenerationRequest) -> Vec<String> {
    let per_excerpt: Vec<Vec<String>> = request
        .context
        .excerpts
        .iter()
        .map(|e| split_sentences(&e.text))
        .filter(|s| !s.is_empty())
        .collect();
    if per_excerpt.is_empty() {
        return Vec::new();
    }

    // Later attempts start from a different excerpt so retries differ.
    let offset = (request.attempt.saturating_sub(1) as usize) % per_excerpt.len();
    let longest = per_excerpt.iter().map(Vec::len).max().unwrap_or(0);
    let mut out: Vec<String> = Vec::new();
    for depth in 0..longest {
        for i in 0..per_excerpt.len() {
            let excerpt = &per_excerpt[(i + offset) % per_excerpt.len()];
            if let Some(sentence) = excerpt.get(depth) {
                if !out.contains(sentence) {
                    out.push(sentence.clone());
                }
            }
        }
    }
    out
}

/// Cut a sentence to `max` words, keeping it a sentence
fn clip(sentence: &str, max: usize) -> String {
    let words: Vec<&str> = sentence.split_whitespace().take(max).collect();
    let mut clipped = words.join(" ");
    clipped = clipped.trim_end_matches([',', ';', ':']).to_string();
    if !clipped.ends_with(['.', '!', '?']) {
        clipped.push('.');
    }
    clipped
}

#[async_trait]
impl GenerationProvider for ExtractiveGenerator {
    fn name(&self) -> &str {
        "extractive"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let sentences = interleaved_sentences(request);
        if sentences.is_empty() {
            return Err(GenerationError::InvalidOutput("no source sentences to draw from".to_string()));
        }

        let range = request.word_range;
        let mut chosen: Vec<String> = Vec::new();
        let mut words = 0;
        for sentence in &sentences {
            if words >= range.min {
                break;
            }
            let count = word_count(sentence);
            if words + count <= range.max {
                chosen.push(sentence.clone());
                words += count;
            }
        }

        if chosen.is_empty() {
            chosen.push(clip(&sentences[0], range.max));
        }
        Ok(chosen.join(" "))
    }
}
