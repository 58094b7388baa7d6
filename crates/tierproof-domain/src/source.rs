//! Source data module - normalized provider documents for one unit

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of document a provider returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Regulatory filing or earnings report
    Filing,
    /// Analyst research note
    AnalystReport,
    /// News article or press release
    News,
    /// Market data snapshot
    MarketData,
    /// Anything else
    #[serde(other)]
    Other,
}

/// A structured field value
///
/// Deserialized untagged: JSON numbers become `Number`, ISO date strings
/// become `Date`, every other string is `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric metric
    Number(f64),
    /// Calendar date
    Date(NaiveDate),
    /// Text value such as a rating label or a firm name
    Text(String),
}

impl FieldValue {
    /// Render the value for display in prompts and discrepancy messages
    pub fn display(&self) -> String {
        match self {
            FieldValue::Number(n) => crate::text::format_number(*n),
            FieldValue::Date(d) => d.to_string(),
            FieldValue::Text(t) => t.clone(),
        }
    }
}

/// Normalized output of one adapter call; never mutated after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Provider tag (e.g. "filings")
    pub provider: String,
    /// Document kind
    pub kind: DocumentKind,
    /// When the document was published
    pub timestamp: DateTime<Utc>,
    /// Free text body
    #[serde(default)]
    pub text: String,
    /// Structured fields keyed by snake_case name (e.g. "price_target")
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl SourceDocument {
    /// Create a document with no structured fields
    pub fn new(
        provider: impl Into<String>,
        kind: DocumentKind,
        timestamp: DateTime<Utc>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            kind,
            timestamp,
            text: text.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a structured field
    pub fn with_field(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

/// Outcome status reported by an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterStatus {
    /// All requested data was returned
    Success,
    /// Some data was returned, some was unavailable or malformed
    Partial,
    /// Nothing usable was returned
    Failed,
}

impl AdapterStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterStatus::Success => "success",
            AdapterStatus::Partial => "partial",
            AdapterStatus::Failed => "failed",
        }
    }
}

/// Result of fetching one provider for one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFetch {
    /// Provider tag
    pub provider: String,
    /// Reported status
    pub status: AdapterStatus,
    /// Documents returned (empty when failed)
    pub documents: Vec<SourceDocument>,
    /// Failure or partial-data reason, if any
    pub error: Option<String>,
}

impl SourceFetch {
    /// A fully successful fetch
    pub fn success(provider: impl Into<String>, documents: Vec<SourceDocument>) -> Self {
        Self {
            provider: provider.into(),
            status: AdapterStatus::Success,
            documents,
            error: None,
        }
    }

    /// A fetch that returned only part of the data
    pub fn partial(provider: impl Into<String>, documents: Vec<SourceDocument>, reason: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            status: AdapterStatus::Partial,
            documents,
            error: Some(reason.into()),
        }
    }

    /// A failed fetch; contributes no documents
    pub fn failed(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            status: AdapterStatus::Failed,
            documents: Vec::new(),
            error: Some(reason.into()),
        }
    }
}

/// Everything ingested for one unit, one entry per adapter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceBundle {
    /// Per-provider fetch results, in adapter order
    pub fetches: Vec<SourceFetch>,
}

impl SourceBundle {
    /// Build a bundle from fetch results
    pub fn new(fetches: Vec<SourceFetch>) -> Self {
        Self { fetches }
    }

    /// All documents across providers
    pub fn documents(&self) -> impl Iterator<Item = &SourceDocument> {
        self.fetches.iter().flat_map(|f| f.documents.iter())
    }

    /// Total number of documents
    pub fn document_count(&self) -> usize {
        self.fetches.iter().map(|f| f.documents.len()).sum()
    }

    /// Fetches that contributed at least one document
    pub fn available(&self) -> impl Iterator<Item = &SourceFetch> {
        self.fetches.iter().filter(|f| !f.documents.is_empty())
    }

    /// Providers whose adapter reported `failed`
    pub fn failed_providers(&self) -> Vec<&str> {
        self.fetches
            .iter()
            .filter(|f| f.status == AdapterStatus::Failed)
            .map(|f| f.provider.as_str())
            .collect()
    }

    /// Earliest document timestamp, as a date
    pub fn earliest_timestamp(&self) -> Option<NaiveDate> {
        self.documents().map(|d| d.timestamp.date_naive()).min()
    }
}
