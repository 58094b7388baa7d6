//! Tierproof Domain Layer
//!
//! Core model for the tiered summary pipeline. This crate defines the value
//! objects every other crate exchanges and the trait seams through which the
//! pipeline reaches its external collaborators (source adapters, the
//! generation capability, passage retrieval and persistence).
//!
//! ## Key Concepts
//!
//! - **Unit**: one instrument processed in one run
//! - **SourceDocument**: normalized output of one provider adapter call
//! - **Tier**: brief, medium or expanded summary of a unit
//! - **TierArtifact**: the evolving work product of one tier, with its
//!   bounded attempt counter and corrective instructions
//! - **Claim**: one atomic, independently checkable assertion
//! - **TierVerification**: per-claim, per-source verification outcomes
//! - **RiskScore**: advisory hallucination risk for a tier
//! - **BatchRunRecord**: the single audit record of a batch run
//!
//! ## Architecture
//!
//! - Pure data and rules only; no I/O happens here
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions (see [`traits`])

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artifact;
pub mod claim;
pub mod context;
pub mod error;
pub mod record;
pub mod risk;
pub mod source;
pub mod text;
pub mod tier;
pub mod traits;
pub mod unit;
pub mod verification;

// Re-exports for convenience
pub use artifact::{CorrectionKind, CorrectiveInstruction, TierArtifact, TierStatus, TransitionError};
pub use claim::{AmountUnit, Claim, ClaimId, ClaimKind, ClaimValue};
pub use context::{AssembledContext, Excerpt, GenerationRequest, Passage};
pub use error::{AdapterError, ExtractionError, GenerationError, PersistenceError};
pub use record::{
    AttemptStats, BatchRunRecord, SourceSummary, TierOutcome, TierSummary, UnitOutcome, UnitRecord, UnitStatus,
};
pub use risk::{RiskBucket, RiskScore};
pub use source::{AdapterStatus, DocumentKind, FieldValue, SourceBundle, SourceDocument, SourceFetch};
pub use tier::{Tier, WordRange};
pub use traits::{
    ClaimExtractor, FetchedDocuments, GenerationProvider, PassageRetriever, PersistenceSink, SourceAdapter,
};
pub use unit::{RunId, Unit};
pub use verification::{ClaimVerification, SourceVerification, TierVerification, VerificationStatus};
