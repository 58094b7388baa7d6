//! Tierproof Verification
//!
//! Checks extracted claims against the normalized data of every source that
//! contributed documents, and scores the residual hallucination risk of a
//! tier attempt.
//!
//! # Matching rules
//!
//! | Claim value | Verified when | Failed when |
//! |-------------|---------------|-------------|
//! | Amount | any field or text amount within tolerance (±1%) | a field named like the subject disagrees |
//! | Date | exact match in a field or the text | a date field named like the subject disagrees |
//! | Name | suffix-insensitive match in a text field or the text | a text field named like the subject disagrees |
//! | Statement | closeness to a source sentence ≥ threshold | never |
//!
//! A claim is verified if any source supports it, failed if none supports
//! it and one contradicts it, uncertain otherwise.
//!
//! # Examples
//!
//! ```
//! use tierproof_domain::SourceBundle;
//! use tierproof_verifier::{Verifier, VerifierConfig};
//!
//! let verifier = Verifier::new(VerifierConfig::default());
//! let result = verifier.verify(Vec::new(), &SourceBundle::default());
//!
//! // No claims: vacuous pass
//! assert_eq!(result.pass_rate, 1.0);
//! assert!(result.vacuous);
//! ```

#![warn(missing_docs)]

mod config;
mod risk;
mod verifier;

pub use config::{RiskConfig, VerifierConfig};
pub use risk::RiskScorer;
pub use verifier::Verifier;
