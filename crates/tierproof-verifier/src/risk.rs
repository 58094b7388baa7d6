//! Hallucination risk scoring
//!
//! Three layers, each in 0.0-1.0:
//!
//! - **cross-source**: unverified share of claims measured against the slack a
//!   passing tier is allowed; any direct contradiction saturates the layer
//! - **temporal**: share of dates in the text that cannot be right (after the
//!   run date, or before anything the sources cover)
//! - **uncertainty**: unusually dense hedging next to confident assertions;
//!   hedging on its own scores zero
//!
//! The combined score is advisory: it never fails a tier, it routes it to
//! human review.

use crate::config::RiskConfig;
use chrono::NaiveDate;
use tierproof_domain::text::{contains_phrase, find_amounts, find_dates, split_sentences};
use tierproof_domain::{FieldValue, RiskScore, SourceBundle, TierVerification};
use tracing::debug;

/// Computes the three-layer risk score for a tier attempt
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    config: RiskConfig,
}

impl RiskScorer {
    /// Create a scorer with the given configuration
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Score a tier text given its verification result and sources
    ///
    /// `as_of` is the run date; dates after it are impossible.
    pub fn score(
        &self,
        text: &str,
        verification: &TierVerification,
        sources: &SourceBundle,
        as_of: NaiveDate,
    ) -> RiskScore {
        let cross_source = self.cross_source_layer(verification);
        let temporal = temporal_layer(text, sources, as_of);
        let uncertainty = self.uncertainty_layer(text);

        let score = RiskScore::combine(cross_source, temporal, uncertainty, self.config.weights());
        debug!(
            cross_source,
            temporal,
            uncertainty,
            score = score.score,
            bucket = score.bucket.as_str(),
            "Risk scored"
        );
        score
    }

    /// Whether a score routes its tier to human review
    pub fn needs_review(&self, score: &RiskScore) -> bool {
        score.bucket >= self.config.review_from
    }

    /// A tier can pass the gate with a few unverified claims; those are the
    /// residual risk. The layer reaches 1.0 at `unverified_allowance`.
    fn cross_source_layer(&self, verification: &TierVerification) -> f64 {
        if verification.total() == 0 {
            return 0.0;
        }
        if verification.contradiction_count() > 0 {
            return 1.0;
        }
        ((1.0 - verification.pass_rate) / self.config.unverified_allowance).min(1.0)
    }

    fn uncertainty_layer(&self, text: &str) -> f64 {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return 0.0;
        }

        let has_any = |sentence: &str, markers: &[String]| markers.iter().any(|m| contains_phrase(sentence, m));
        let hedged = sentences
            .iter()
            .filter(|s| has_any(s, &self.config.hedge_markers))
            .count();
        let density = hedged as f64 / sentences.len() as f64;
        let threshold = self.config.hedge_density_threshold;
        if density <= threshold {
            return 0.0;
        }
        let excess = (density - threshold) / (1.0 - threshold);

        let plain: Vec<&String> = sentences
            .iter()
            .filter(|s| !has_any(s, &self.config.hedge_markers))
            .collect();
        if plain.is_empty() {
            return 0.0;
        }
        let confident = plain
            .iter()
            .filter(|s| has_any(s, &self.config.confident_markers) || find_amounts(s).iter().any(|a| !a.is_year))
            .count();

        excess * confident as f64 / plain.len() as f64
    }
}

fn temporal_layer(text: &str, sources: &SourceBundle, as_of: NaiveDate) -> f64 {
    let dates = find_dates(text);
    if dates.is_empty() {
        return 0.0;
    }

    let lower_bound = earliest_source_date(sources);
    let impossible = dates
        .iter()
        .filter(|d| d.date > as_of || lower_bound.is_some_and(|lower| d.date < lower))
        .count();
    impossible as f64 / dates.len() as f64
}

/// Earliest of all document timestamps and all dates the sources mention
fn earliest_source_date(sources: &SourceBundle) -> Option<NaiveDate> {
    let mentioned = sources.documents().flat_map(|doc| {
        let in_text = find_dates(&doc.text).into_iter().map(|d| d.date);
        let in_fields = doc.fields.values().filter_map(|f| match f {
            FieldValue::Date(date) => Some(*date),
            _ => None,
        });
        in_text.chain(in_fields).collect::<Vec<_>>()
    });
    mentioned.chain(sources.earliest_timestamp()).min()
}
