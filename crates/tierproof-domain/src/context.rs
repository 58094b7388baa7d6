//! Assembled generation context and the generation request

use crate::source::DocumentKind;
use crate::tier::{Tier, WordRange};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// A bounded excerpt of one source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Excerpt {
    /// Provider the excerpt came from
    pub provider: String,
    /// Kind of the originating document
    pub kind: DocumentKind,
    /// Free text of the document, possibly cut
    pub text: String,
    /// Structured fields rendered as (name, value)
    pub fields: Vec<(String, String)>,
    /// Whether the excerpt was cut to fit the budget
    pub truncated: bool,
}

impl Excerpt {
    /// Characters counted against the context budget
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
            + self
                .fields
                .iter()
                .map(|(k, v)| k.chars().count() + v.chars().count() + 2)
                .sum::<usize>()
    }
}

/// A retrieved semantically relevant passage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Where the passage came from
    pub source: String,
    /// Passage text
    pub text: String,
    /// Retrieval relevance score
    pub score: f64,
}

/// Input a tier generator consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledContext {
    /// Tier this context was assembled for
    pub tier: Tier,
    /// Unit identifier
    pub unit_id: String,
    /// Unit display name
    pub unit_name: String,
    /// Excerpts, interleaved across providers
    pub excerpts: Vec<Excerpt>,
    /// Retrieved passages
    pub passages: Vec<Passage>,
    /// Whether anything was dropped or cut to fit the budget
    pub truncated: bool,
}

impl AssembledContext {
    /// Providers represented among the excerpts, in first-seen order
    pub fn providers(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for excerpt in &self.excerpts {
            if !seen.contains(&excerpt.provider.as_str()) {
                seen.push(&excerpt.provider);
            }
        }
        seen
    }

    /// Total characters of excerpt and passage text
    pub fn char_len(&self) -> usize {
        self.excerpts.iter().map(Excerpt::char_len).sum::<usize>()
            + self.passages.iter().map(|p| p.text.chars().count()).sum::<usize>()
    }

    /// Render the context as plain text for a prompt
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Instrument: {} ({})", self.unit_name, self.unit_id);
        for excerpt in &self.excerpts {
            let _ = writeln!(out, "\n[{}]", excerpt.provider);
            if !excerpt.text.is_empty() {
                let _ = writeln!(out, "{}", excerpt.text);
            }
            for (name, value) in &excerpt.fields {
                let _ = writeln!(out, "  {}: {}", name, value);
            }
        }
        if !self.passages.is_empty() {
            let _ = writeln!(out, "\n[related passages]");
            for passage in &self.passages {
                let _ = writeln!(out, "- {}", passage.text);
            }
        }
        out
    }
}

/// One call to the generation capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Tier to generate
    pub tier: Tier,
    /// Context to generate from
    pub context: AssembledContext,
    /// Every corrective instruction accumulated so far, oldest first
    pub corrections: Vec<String>,
    /// Word range the caller will enforce
    pub word_range: WordRange,
    /// 1-based attempt number
    pub attempt: u32,
}
