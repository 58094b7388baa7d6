//! Context assembly
//!
//! Builds the bounded input of one tier generation from a unit's source
//! bundle and retrieved passages. Excerpts are taken round-robin across
//! providers: every available provider gets its first document in (with a
//! fair share of the budget) before any provider contributes a second one.

use std::collections::VecDeque;
use tierproof_domain::{AssembledContext, Excerpt, Passage, SourceBundle, SourceDocument, Tier, Unit};
use tracing::debug;

use crate::config::PipelineConfig;

/// Assembles per-tier generation context under a character budget
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    budgets: [usize; 3],
    passage_share: f64,
}

impl ContextAssembler {
    /// Create an assembler using the pipeline's budgets
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            budgets: Tier::ALL.map(|tier| config.context_budget(tier)),
            passage_share: config.passage_share,
        }
    }

    fn budget(&self, tier: Tier) -> usize {
        match tier {
            Tier::Brief => self.budgets[0],
            Tier::Medium => self.budgets[1],
            Tier::Expanded => self.budgets[2],
        }
    }

    /// Assemble the context for one tier
    ///
    /// Failed providers contribute nothing. Passages are expected in
    /// relevance order and only get the configured share of the budget.
    pub fn assemble(&self, unit: &Unit, tier: Tier, sources: &SourceBundle, passages: Vec<Passage>) -> AssembledContext {
        let budget = self.budget(tier);
        let mut truncated = false;

        let passage_budget = if passages.is_empty() {
            0
        } else {
            (budget as f64 * self.passage_share) as usize
        };
        let mut kept_passages = Vec::new();
        let mut passage_chars = 0;
        for passage in passages {
            let len = passage.text.chars().count();
            if passage_chars + len > passage_budget {
                truncated = true;
                continue;
            }
            passage_chars += len;
            kept_passages.push(passage);
        }

        let mut queues: Vec<VecDeque<&SourceDocument>> = sources
            .available()
            .filter(|fetch| !fetch.documents.is_empty())
            .map(|fetch| fetch.documents.iter().collect())
            .collect();

        let mut remaining = budget.saturating_sub(passage_chars);
        let mut excerpts = Vec::new();

        // First round: one excerpt per provider, each capped at a fair share.
        let share = remaining / queues.len().max(1);
        for queue in &mut queues {
            if let Some(doc) = queue.pop_front() {
                match excerpt(doc, share.min(remaining)) {
                    Some(ex) => {
                        truncated |= ex.truncated;
                        remaining = remaining.saturating_sub(ex.char_len());
                        excerpts.push(ex);
                    }
                    None => truncated = true,
                }
            }
        }

        // Later rounds: round-robin until the budget or the documents run out.
        'rounds: loop {
            let mut progressed = false;
            for queue in &mut queues {
                if remaining == 0 {
                    break 'rounds;
                }
                if let Some(doc) = queue.pop_front() {
                    progressed = true;
                    match excerpt(doc, remaining) {
                        Some(ex) => {
                            truncated |= ex.truncated;
                            remaining = remaining.saturating_sub(ex.char_len());
                            excerpts.push(ex);
                        }
                        None => truncated = true,
                    }
                }
            }
            if !progressed {
                break;
            }
        }
        truncated |= queues.iter().any(|q| !q.is_empty());

        let context = AssembledContext {
            tier,
            unit_id: unit.id.clone(),
            unit_name: unit.name.clone(),
            excerpts,
            passages: kept_passages,
            truncated,
        };
        debug!(
            tier = tier.as_str(),
            excerpts = context.excerpts.len(),
            passages = context.passages.len(),
            chars = context.char_len(),
            truncated,
            "Context assembled"
        );
        context
    }
}

/// Build an excerpt of at most `cap` characters; fields are kept before text
fn excerpt(doc: &SourceDocument, cap: usize) -> Option<Excerpt> {
    let mut used = 0;
    let mut truncated = false;
    let mut fields = Vec::new();
    for (name, value) in &doc.fields {
        let value = value.display();
        let len = name.chars().count() + value.chars().count() + 2;
        if used + len > cap {
            truncated = true;
            continue;
        }
        used += len;
        fields.push((name.clone(), value));
    }

    let (text, cut) = clip_chars(&doc.text, cap - used);
    truncated |= cut;
    if fields.is_empty() && text.is_empty() {
        return None;
    }

    Some(Excerpt {
        provider: doc.provider.clone(),
        kind: doc.kind,
        text,
        fields,
        truncated,
    })
}

/// Cut text to at most `max` characters at a word boundary
fn clip_chars(text: &str, max: usize) -> (String, bool) {
    if text.chars().count() <= max {
        return (text.to_string(), false);
    }
    let mut out = String::new();
    for word in text.split_whitespace() {
        let extra = if out.is_empty() { 0 } else { 1 };
        if out.chars().count() + extra + word.chars().count() > max {
            break;
        }
        if extra == 1 {
            out.push(' ');
        }
        out.push_str(word);
    }
    (out, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tierproof_domain::{DocumentKind, FieldValue, RunId, SourceFetch};

    fn doc(provider: &str, text: &str) -> SourceDocument {
        SourceDocument::new(provider, DocumentKind::News, Utc::now(), text)
    }

    fn unit() -> Unit {
        Unit::new("TICK", "Tick Corp", RunId::new())
    }

    fn config(brief_chars: usize) -> PipelineConfig {
        PipelineConfig {
            brief_context_chars: brief_chars,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_every_provider_before_depth() {
        let sources = SourceBundle::new(vec![
            SourceFetch::success(
                "filings",
                vec![doc("filings", &"a".repeat(40)), doc("filings", &"b".repeat(40))],
            ),
            SourceFetch::success("news", vec![doc("news", &"c".repeat(40))]),
        ]);

        let context = ContextAssembler::new(&config(100)).assemble(&unit(), Tier::Brief, &sources, Vec::new());
        let providers: Vec<&str> = context.excerpts.iter().map(|e| e.provider.as_str()).collect();
        assert_eq!(providers, vec!["filings", "news"]);
        assert!(context.truncated);
    }

    #[test]
    fn test_long_first_document_cannot_crowd_out_others() {
        let sources = SourceBundle::new(vec![
            SourceFetch::success("filings", vec![doc("filings", &"word ".repeat(100))]),
            SourceFetch::success("analyst", vec![doc("analyst", "Buy rating.")]),
        ]);

        let context = ContextAssembler::new(&config(120)).assemble(&unit(), Tier::Brief, &sources, Vec::new());
        assert_eq!(context.providers(), vec!["filings", "analyst"]);
        assert!(context.excerpts[0].truncated);
        assert!(context.char_len() <= 120);
    }

    #[test]
    fn test_failed_provider_contributes_nothing() {
        let sources = SourceBundle::new(vec![
            SourceFetch::failed("filings", "timeout"),
            SourceFetch::success(
                "analyst",
                vec![doc("analyst", "Buy rating.").with_field("price_target", FieldValue::Number(195.0))],
            ),
        ]);

        let context = ContextAssembler::new(&PipelineConfig::default()).assemble(&unit(), Tier::Medium, &sources, Vec::new());
        assert_eq!(context.providers(), vec!["analyst"]);
        assert_eq!(context.excerpts[0].fields, vec![("price_target".to_string(), "195".to_string())]);
        assert!(!context.truncated);
    }

    #[test]
    fn test_passages_limited_to_their_share() {
        let sources = SourceBundle::new(vec![SourceFetch::success("news", vec![doc("news", "Buyback approved.")])]);
        let passages = vec![
            Passage {
                source: "archive".to_string(),
                text: "x".repeat(15),
                score: 0.9,
            },
            Passage {
                source: "archive".to_string(),
                text: "y".repeat(15),
                score: 0.5,
            },
        ];

        // 20% of 100 characters leaves room for one passage
        let context = ContextAssembler::new(&config(100)).assemble(&unit(), Tier::Brief, &sources, passages);
        assert_eq!(context.passages.len(), 1);
        assert_eq!(context.passages[0].score, 0.9);
        assert!(context.truncated);
    }

    #[test]
    fn test_clip_at_word_boundary() {
        assert_eq!(clip_chars("alpha beta gamma", 11), ("alpha beta".to_string(), true));
        assert_eq!(clip_chars("alpha", 11), ("alpha".to_string(), false));
    }
}
