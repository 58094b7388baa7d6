//! Adapter reading provider documents from JSON files

use crate::error::{read_json, SourceError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tierproof_domain::{AdapterError, DocumentKind, FetchedDocuments, FieldValue, SourceAdapter, SourceDocument};
use tracing::{debug, warn};

/// On-disk shape of one provider file
#[derive(Debug, Deserialize)]
struct FixtureFile {
    documents: Vec<serde_json::Value>,
}

/// On-disk shape of one document; the provider comes from the directory
#[derive(Debug, Deserialize)]
struct DocumentEntry {
    kind: DocumentKind,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    fields: BTreeMap<String, FieldValue>,
}

/// Reads `<root>/<provider>/<unit_id>.json`
///
/// A missing file fails the fetch. Entries that do not parse are dropped
/// and reported, which the pipeline records as a partial fetch.
#[derive(Debug, Clone)]
pub struct FixtureAdapter {
    root: PathBuf,
    provider: String,
}

impl FixtureAdapter {
    /// Create an adapter for one provider directory under `root`
    pub fn new(root: impl Into<PathBuf>, provider: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            provider: provider.into(),
        }
    }

    /// Path of the file holding a unit's documents
    pub fn path_for(&self, unit_id: &str) -> PathBuf {
        self.root.join(&self.provider).join(format!("{}.json", unit_id))
    }

    /// The data root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load and normalize a unit's documents
    pub async fn load(&self, unit_id: &str) -> Result<FetchedDocuments, SourceError> {
        let path = self.path_for(unit_id);
        let file: FixtureFile = read_json(path).await?;

        let mut fetched = FetchedDocuments::default();
        for (idx, value) in file.documents.into_iter().enumerate() {
            match serde_json::from_value::<DocumentEntry>(value) {
                Ok(entry) if entry.text.trim().is_empty() && entry.fields.is_empty() => {
                    warn!(provider = %self.provider, unit_id, "Document {} is empty", idx);
                    fetched.dropped.push(format!("document {}: empty", idx));
                }
                Ok(entry) => fetched.documents.push(SourceDocument {
                    provider: self.provider.clone(),
                    kind: entry.kind,
                    timestamp: entry.timestamp,
                    text: entry.text,
                    fields: entry.fields,
                }),
                Err(e) => {
                    warn!(provider = %self.provider, unit_id, "Skipping document {}: {}", idx, e);
                    fetched.dropped.push(format!("document {}: {}", idx, e));
                }
            }
        }

        debug!(
            provider = %self.provider,
            unit_id,
            documents = fetched.documents.len(),
            dropped = fetched.dropped.len(),
            "Fixture loaded"
        );
        Ok(fetched)
    }
}

#[async_trait]
impl SourceAdapter for FixtureAdapter {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn fetch(&self, unit_id: &str) -> Result<FetchedDocuments, AdapterError> {
        Ok(self.load(unit_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, provider: &str, unit: &str, body: &str) {
        let path = dir.path().join(provider);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join(format!("{}.json", unit)), body).unwrap();
    }

    #[tokio::test]
    async fn test_load_documents() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "analyst",
            "TICK",
            r#"{"documents": [{
                "kind": "analyst_report",
                "timestamp": "2024-10-18T09:00:00Z",
                "text": "Morgan Stanley reiterated a Buy rating with a price target of $195.",
                "fields": {"price_target": 195, "rating": "Buy"}
            }]}"#,
        );

        let adapter = FixtureAdapter::new(dir.path(), "analyst");
        let fetched = adapter.fetch("TICK").await.unwrap();
        assert_eq!(fetched.documents.len(), 1);
        assert!(fetched.dropped.is_empty());
        let doc = &fetched.documents[0];
        assert_eq!(doc.provider, "analyst");
        assert_eq!(doc.kind, DocumentKind::AnalystReport);
        assert_eq!(doc.fields["price_target"], FieldValue::Number(195.0));
    }

    #[tokio::test]
    async fn test_malformed_entries_are_dropped() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "news",
            "TICK",
            r#"{"documents": [
                {"kind": "news", "timestamp": "2024-10-16T00:00:00Z", "text": "Buyback approved."},
                {"kind": "news", "timestamp": "yesterday", "text": "Bad timestamp."},
                {"kind": "news", "timestamp": "2024-10-16T00:00:00Z"}
            ]}"#,
        );

        let fetched = FixtureAdapter::new(dir.path(), "news").fetch("TICK").await.unwrap();
        assert_eq!(fetched.documents.len(), 1);
        assert_eq!(fetched.dropped.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_and_unparseable_files() {
        let dir = TempDir::new().unwrap();
        let adapter = FixtureAdapter::new(dir.path(), "filings");
        assert!(matches!(adapter.fetch("NONE").await, Err(AdapterError::NotFound(_))));

        write(&dir, "filings", "BAD", "not json");
        assert!(matches!(adapter.fetch("BAD").await, Err(AdapterError::Malformed(_))));
    }
}
