//! Lexical passage retrieval

use crate::error::{read_json, SourceError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tierproof_domain::text::tokens;
use tierproof_domain::{Passage, PassageRetriever, Tier};
use tracing::{debug, warn};

/// On-disk passage; an empty `tiers` list means every tier
#[derive(Debug, Deserialize)]
struct PassageEntry {
    source: String,
    text: String,
    #[serde(default)]
    tiers: Vec<Tier>,
}

/// Ranks `<root>/passages/<unit_id>.json` by token overlap with the query
///
/// The score is the share of distinct query tokens found in the passage.
/// Retrieval is best-effort: unreadable files yield no passages.
#[derive(Debug, Clone)]
pub struct LexicalRetriever {
    root: PathBuf,
}

impl LexicalRetriever {
    /// Create a retriever over a data root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn load(&self, unit_id: &str) -> Result<Vec<PassageEntry>, SourceError> {
        read_json(self.root.join("passages").join(format!("{}.json", unit_id))).await
    }
}

#[async_trait]
impl PassageRetriever for LexicalRetriever {
    async fn retrieve(&self, unit_id: &str, tier: Tier, query: &str, limit: usize) -> Vec<Passage> {
        let entries = match self.load(unit_id).await {
            Ok(entries) => entries,
            Err(SourceError::NotFound(_)) => {
                debug!(unit_id, "No passages");
                return Vec::new();
            }
            Err(e) => {
                warn!(unit_id, "Passage retrieval failed: {}", e);
                return Vec::new();
            }
        };

        let query_tokens: HashSet<String> = tokens(query).into_iter().collect();
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<Passage> = entries
            .into_iter()
            .filter(|entry| entry.tiers.is_empty() || entry.tiers.contains(&tier))
            .filter_map(|entry| {
                let passage_tokens: HashSet<String> = tokens(&entry.text).into_iter().collect();
                let overlap = query_tokens.intersection(&passage_tokens).count();
                (overlap > 0).then(|| Passage {
                    source: entry.source,
                    text: entry.text,
                    score: overlap as f64 / query_tokens.len() as f64,
                })
            })
            .collect();

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(limit);
        ranked
    }
}

/// Retriever that never returns passages
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetrieval;

#[async_trait]
impl PassageRetriever for NoRetrieval {
    async fn retrieve(&self, _unit_id: &str, _tier: Tier, _query: &str, _limit: usize) -> Vec<Passage> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn retriever_with(body: &str) -> (TempDir, LexicalRetriever) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("passages")).unwrap();
        std::fs::write(dir.path().join("passages").join("TICK.json"), body).unwrap();
        let retriever = LexicalRetriever::new(dir.path());
        (dir, retriever)
    }

    #[tokio::test]
    async fn test_ranked_by_overlap_and_limited() {
        let (_dir, retriever) = retriever_with(
            r#"[
                {"source": "transcript", "text": "Management expects revenue growth to continue."},
                {"source": "transcript", "text": "Revenue growth and margin expansion drove earnings."},
                {"source": "blog", "text": "Unrelated commentary."}
            ]"#,
        );

        let passages = retriever.retrieve("TICK", Tier::Medium, "revenue growth margin", 5).await;
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].text, "Revenue growth and margin expansion drove earnings.");
        assert_eq!(passages[0].score, 1.0);

        let limited = retriever.retrieve("TICK", Tier::Medium, "revenue growth margin", 1).await;
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_tier_filter() {
        let (_dir, retriever) = retriever_with(
            r#"[{"source": "transcript", "text": "Long-range revenue outlook.", "tiers": ["expanded"]}]"#,
        );
        assert!(retriever.retrieve("TICK", Tier::Brief, "revenue", 5).await.is_empty());
        assert_eq!(retriever.retrieve("TICK", Tier::Expanded, "revenue", 5).await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_and_no_retrieval() {
        let dir = TempDir::new().unwrap();
        let retriever = LexicalRetriever::new(dir.path());
        assert!(retriever.retrieve("TICK", Tier::Brief, "revenue", 5).await.is_empty());
        assert!(NoRetrieval.retrieve("TICK", Tier::Brief, "revenue", 5).await.is_empty());
    }
}
