//! Tierproof Claim Extraction
//!
//! Splits a tier's candidate text into atomic claims, each carrying one
//! checkable value (amount, date, name or free statement).
//!
//! # Extractors
//!
//! - [`PatternExtractor`]: deterministic rule-based extraction, no back end needed
//! - [`LlmClaimExtractor`]: prompts a completion back end for a JSON claim list
//!
//! Both implement `ClaimExtractor` from `tierproof-domain`.
//!
//! # Example Usage
//!
//! ```
//! use tierproof_domain::{ClaimExtractor, ClaimKind};
//! use tierproof_extractor::{ExtractorConfig, PatternExtractor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = PatternExtractor::new(ExtractorConfig::default());
//! let claims = extractor
//!     .extract("Tick Corp reported revenue of $5.2 billion for fiscal 2024.")
//!     .await?;
//!
//! assert!(claims.iter().any(|c| c.kind == ClaimKind::Numeric));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod clauses;
mod config;
mod error;
mod llm;
mod parser;
mod pattern;


pub use clauses::{split_clauses, Clause};
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use llm::LlmClaimExtractor;
pub use parser::parse_llm_response;
pub use pattern::PatternExtractor;
