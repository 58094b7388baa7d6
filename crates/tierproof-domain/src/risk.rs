//! Hallucination risk score and buckets

use serde::{Deserialize, Serialize};

/// Risk bucket derived from the combined score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBucket {
    /// score < 0.4
    Low,
    /// 0.4 <= score < 0.6
    Medium,
    /// 0.6 <= score <= 0.8
    High,
    /// score > 0.8
    Critical,
}

impl RiskBucket {
    /// Map a score to its bucket
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            RiskBucket::Critical
        } else if score >= 0.6 {
            RiskBucket::High
        } else if score >= 0.4 {
            RiskBucket::Medium
        } else {
            RiskBucket::Low
        }
    }

    /// Whether this bucket routes the tier to human review
    pub fn needs_review(&self) -> bool {
        matches!(self, RiskBucket::High | RiskBucket::Critical)
    }

    /// Get the bucket name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBucket::Low => "low",
            RiskBucket::Medium => "medium",
            RiskBucket::High => "high",
            RiskBucket::Critical => "critical",
        }
    }

    /// Parse a bucket from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(RiskBucket::Low),
            "medium" => Some(RiskBucket::Medium),
            "high" => Some(RiskBucket::High),
            "critical" => Some(RiskBucket::Critical),
            _ => None,
        }
    }
}

/// Three-layer hallucination risk for one tier attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    /// Cross-source consistency layer (0.0-1.0)
    pub cross_source: f64,
    /// Temporal consistency layer (0.0-1.0)
    pub temporal: f64,
    /// Uncertainty quantification layer (0.0-1.0)
    pub uncertainty: f64,
    /// Weighted combination (0.0-1.0)
    pub score: f64,
    /// Bucket of `score`
    pub bucket: RiskBucket,
}

impl RiskScore {
    /// Combine the three layers with the given weights
    pub fn combine(cross_source: f64, temporal: f64, uncertainty: f64, weights: [f64; 3]) -> Self {
        let cross_source = cross_source.clamp(0.0, 1.0);
        let temporal = temporal.clamp(0.0, 1.0);
        let uncertainty = uncertainty.clamp(0.0, 1.0);
        let total: f64 = weights.iter().sum();
        let raw = weights[0] * cross_source + weights[1] * temporal + weights[2] * uncertainty;
        let score = if total > 0.0 { (raw / total).clamp(0.0, 1.0) } else { 0.0 };

        Self {
            cross_source,
            temporal,
            uncertainty,
            score,
            bucket: RiskBucket::from_score(score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(RiskBucket::from_score(0.0), RiskBucket::Low);
        assert_eq!(RiskBucket::from_score(0.399), RiskBucket::Low);
        assert_eq!(RiskBucket::from_score(0.4), RiskBucket::Medium);
        assert_eq!(RiskBucket::from_score(0.6), RiskBucket::High);
        assert_eq!(RiskBucket::from_score(0.8), RiskBucket::High);
        assert_eq!(RiskBucket::from_score(0.81), RiskBucket::Critical);
    }

    #[test]
    fn test_review_routing() {
        assert!(!RiskBucket::Low.needs_review());
        assert!(!RiskBucket::Medium.needs_review());
        assert!(RiskBucket::High.needs_review());
        assert!(RiskBucket::Critical.needs_review());
    }

    #[test]
    fn test_combine_default_weights() {
        let score = RiskScore::combine(1.0, 0.0, 0.0, [0.5, 0.2, 0.3]);
        assert!((score.score - 0.5).abs() < 1e-9);
        assert_eq!(score.bucket, RiskBucket::Medium);

        let worst = RiskScore::combine(1.0, 1.0, 1.0, [0.5, 0.2, 0.3]);
        assert!((worst.score - 1.0).abs() < 1e-9);
        assert_eq!(worst.bucket, RiskBucket::Critical);
    }

    proptest! {
        #[test]
        fn prop_bucket_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(RiskBucket::from_score(lo) <= RiskBucket::from_score(hi));
        }

        #[test]
        fn prop_combined_score_in_unit_interval(
            c in -1.0f64..2.0, t in -1.0f64..2.0, u in -1.0f64..2.0,
        ) {
            let score = RiskScore::combine(c, t, u, [0.5, 0.2, 0.3]);
            prop_assert!((0.0..=1.0).contains(&score.score));
        }
    }
}
