//! Tierproof Unit Pipeline
//!
//! Composes ingestion, context assembly, generation, claim extraction,
//! verification and risk scoring into the per-unit pipeline.
//!
//! # Flow
//!
//! 1. Fetch from every source adapter concurrently, join
//! 2. Spawn the three tiers concurrently; each assembles its own context
//!    and runs its own bounded retry loop
//! 3. Join the tiers, derive the unit status, persist once
//!
//! # State machine
//!
//! Each tier moves `generating → verifying → passed`, or
//! `→ regenerating → generating` while attempts remain, or `→ exhausted`.
//! Generation failures and out-of-range lengths spend attempts from the same
//! budget as fact-check failures. Every failed attempt appends one
//! corrective instruction.
//!
//! # Examples
//!
//! ```no_run
//! use tierproof_pipeline::{Collaborators, PipelineConfig, UnitPipeline};
//! use tierproof_domain::{RunId, Unit};
//! use tierproof_verifier::{RiskScorer, Verifier};
//!
//! # async fn example(collaborators: Collaborators) -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = UnitPipeline::new(
//!     PipelineConfig::default(),
//!     Verifier::default(),
//!     RiskScorer::default(),
//!     collaborators,
//! )?;
//! let record = pipeline.run(Unit::new("TICK", "Tick Corp", RunId::new())).await?;
//! println!("{}: {}", record.unit.id, record.status.as_str());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod context;
mod error;
mod retry;
mod tier;
mod unit;

pub use config::{ExpandedProfile, PipelineConfig};
pub use context::ContextAssembler;
pub use error::PipelineError;
pub use retry::{RetryController, RetryDecision, SOURCE_ONLY_DIRECTIVE};
pub use tier::TierRunner;
pub use unit::{Collaborators, UnitPipeline};
