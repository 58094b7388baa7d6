//! Tierproof Sources
//!
//! Source adapters and passage retrieval behind the `SourceAdapter` and
//! `PassageRetriever` seams of `tierproof-domain`.
//!
//! # Data root layout
//!
//! ```text
//! <root>/
//!   units.json                  known units: [{"id": "TICK", "name": "Tick Corp"}]
//!   <provider>/<unit_id>.json   {"documents": [{kind, timestamp, text, fields}]}
//!   passages/<unit_id>.json     [{source, text, tiers?}]
//! ```
//!
//! # Adapters
//!
//! - [`FixtureAdapter`]: one provider directory of JSON files
//! - [`StaticAdapter`]: in-memory documents with delay and failure injection,
//!   optionally instrumented with an [`InFlightGauge`]

#![warn(missing_docs)]

mod catalogue;
mod error;
mod fixture;
mod memory;
mod retrieval;

pub use catalogue::{load_catalogue, resolve_units, UnitEntry, CATALOGUE_FILE};
pub use error::SourceError;
pub use fixture::FixtureAdapter;
pub use memory::{GaugeGuard, InFlightGauge, StaticAdapter};
pub use retrieval::{LexicalRetriever, NoRetrieval};

/// Provider tags used by the default adapter set
pub const DEFAULT_PROVIDERS: [&str; 3] = ["filings", "analyst", "news"];
