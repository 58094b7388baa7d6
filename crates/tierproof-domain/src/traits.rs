//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and its
//! collaborators. Implementations live in other crates and are injected as
//! `Arc<dyn Trait>` once per batch run, so tests can substitute
//! deterministic stubs.

use crate::context::{GenerationRequest, Passage};
use crate::error::{AdapterError, ExtractionError, GenerationError, PersistenceError};
use crate::record::{BatchRunRecord, UnitRecord};
use crate::source::SourceDocument;
use crate::tier::Tier;
use crate::Claim;
use async_trait::async_trait;

/// Documents returned by an adapter, plus any entries it had to drop
#[derive(Debug, Clone, Default)]
pub struct FetchedDocuments {
    /// Normalized documents
    pub documents: Vec<SourceDocument>,
    /// Reasons for entries that could not be normalized
    pub dropped: Vec<String>,
}

impl FetchedDocuments {
    /// A complete result
    pub fn complete(documents: Vec<SourceDocument>) -> Self {
        Self {
            documents,
            dropped: Vec::new(),
        }
    }
}

/// Per-provider client returning normalized documents for one unit
///
/// Implemented by the infrastructure layer (tierproof-sources)
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Provider tag stamped on every document
    fn provider(&self) -> &str;

    /// Fetch documents for a unit
    ///
    /// `Ok` with dropped entries is reported as partial by the caller;
    /// `Err` is reported as failed.
    async fn fetch(&self, unit_id: &str) -> Result<FetchedDocuments, AdapterError>;
}

/// The non-deterministic text generation capability
///
/// Implemented by tierproof-llm
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Produce candidate text for one tier
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Decomposes tier text into atomic claims
///
/// Implemented by tierproof-extractor
#[async_trait]
pub trait ClaimExtractor: Send + Sync {
    /// Extract zero or more claims
    async fn extract(&self, text: &str) -> Result<Vec<Claim>, ExtractionError>;
}

/// Retrieval of semantically relevant passages
///
/// Implemented by tierproof-sources
#[async_trait]
pub trait PassageRetriever: Send + Sync {
    /// Up to `limit` passages relevant to `query` for this unit and tier
    async fn retrieve(&self, unit_id: &str, tier: Tier, query: &str, limit: usize) -> Vec<Passage>;
}

/// Destination for unit records and the batch run record
///
/// Implemented by tierproof-store
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Store one unit's full record; either all of it lands or none does
    async fn store_unit(&self, record: &UnitRecord) -> Result<(), PersistenceError>;

    /// Store the finalized batch run record
    async fn store_run(&self, record: &BatchRunRecord) -> Result<(), PersistenceError>;
}
