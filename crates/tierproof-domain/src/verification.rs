//! Verification result types
//!
//! Results are recorded per (claim, source) and rolled up per claim and per
//! tier. The tier pass rate is computed once over all sources combined.

use crate::claim::{Claim, ClaimId};
use serde::{Deserialize, Serialize};

/// Outcome of checking a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Supporting evidence found
    Verified,
    /// No support and a matching field directly contradicts the claim
    Failed,
    /// The fact is not mentioned
    Uncertain,
}

impl VerificationStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Verified => "verified",
            VerificationStatus::Failed => "failed",
            VerificationStatus::Uncertain => "uncertain",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "verified" => Some(VerificationStatus::Verified),
            "failed" => Some(VerificationStatus::Failed),
            "uncertain" => Some(VerificationStatus::Uncertain),
            _ => None,
        }
    }
}

/// Result of checking one claim against one provider's documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceVerification {
    /// Claim checked
    pub claim_id: ClaimId,
    /// Provider checked against
    pub provider: String,
    /// Outcome against this provider
    pub status: VerificationStatus,
    /// Matched evidence text, if any
    pub evidence: Option<String>,
    /// Why the claim is wrong, when `failed`
    pub discrepancy: Option<String>,
    /// The value this provider records, when it contradicts the claim
    pub expected: Option<String>,
}

impl SourceVerification {
    /// Supporting result
    pub fn verified(claim_id: ClaimId, provider: impl Into<String>, evidence: impl Into<String>) -> Self {
        Self {
            claim_id,
            provider: provider.into(),
            status: VerificationStatus::Verified,
            evidence: Some(evidence.into()),
            discrepancy: None,
            expected: None,
        }
    }

    /// Contradicting result
    pub fn failed(
        claim_id: ClaimId,
        provider: impl Into<String>,
        evidence: impl Into<String>,
        discrepancy: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            claim_id,
            provider: provider.into(),
            status: VerificationStatus::Failed,
            evidence: Some(evidence.into()),
            discrepancy: Some(discrepancy.into()),
            expected: Some(expected.into()),
        }
    }

    /// The provider does not mention the fact
    pub fn uncertain(claim_id: ClaimId, provider: impl Into<String>) -> Self {
        Self {
            claim_id,
            provider: provider.into(),
            status: VerificationStatus::Uncertain,
            evidence: None,
            discrepancy: None,
            expected: None,
        }
    }
}

/// A claim with its per-source results and combined status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimVerification {
    /// The claim
    pub claim: Claim,
    /// Combined status across sources
    pub status: VerificationStatus,
    /// One entry per provider that contributed documents
    pub sources: Vec<SourceVerification>,
}

impl ClaimVerification {
    /// Combine per-source results
    ///
    /// `verified` if any source supports the claim, `failed` if none does and
    /// at least one contradicts it, `uncertain` otherwise.
    pub fn combine(claim: Claim, sources: Vec<SourceVerification>) -> Self {
        let status = if sources.iter().any(|s| s.status == VerificationStatus::Verified) {
            VerificationStatus::Verified
        } else if sources.iter().any(|s| s.status == VerificationStatus::Failed) {
            VerificationStatus::Failed
        } else {
            VerificationStatus::Uncertain
        };
        Self { claim, status, sources }
    }

    /// Source results that contradict the claim
    pub fn contradictions(&self) -> impl Iterator<Item = &SourceVerification> {
        self.sources.iter().filter(|s| s.status == VerificationStatus::Failed)
    }
}

/// Aggregate verification of one tier attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierVerification {
    /// Per-claim results
    pub claims: Vec<ClaimVerification>,
    /// Claims verified
    pub verified: usize,
    /// Claims failed
    pub failed: usize,
    /// Claims uncertain
    pub uncertain: usize,
    /// verified / total, or 1.0 when there are no claims
    pub pass_rate: f64,
    /// True when the pass rate is 1.0 only because nothing was checked
    pub vacuous: bool,
}

impl TierVerification {
    /// Aggregate claim results
    pub fn from_claims(claims: Vec<ClaimVerification>) -> Self {
        let count = |status| claims.iter().filter(|c| c.status == status).count();
        let verified = count(VerificationStatus::Verified);
        let failed = count(VerificationStatus::Failed);
        let uncertain = count(VerificationStatus::Uncertain);
        let vacuous = claims.is_empty();
        let pass_rate = if vacuous {
            1.0
        } else {
            verified as f64 / claims.len() as f64
        };

        Self {
            claims,
            verified,
            failed,
            uncertain,
            pass_rate,
            vacuous,
        }
    }

    /// Total number of claims
    pub fn total(&self) -> usize {
        self.claims.len()
    }

    /// Whether the tier passes the gate
    pub fn passes(&self, threshold: f64) -> bool {
        self.pass_rate >= threshold
    }

    /// Number of (claim, source) pairs that directly contradict a claim
    pub fn contradiction_count(&self) -> usize {
        self.claims.iter().map(|c| c.contradictions().count()).sum()
    }

    /// Claims that did not verify
    pub fn unverified(&self) -> impl Iterator<Item = &ClaimVerification> {
        self.claims.iter().filter(|c| c.status != VerificationStatus::Verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::{ClaimKind, ClaimValue};

    fn claim(text: &str) -> Claim {
        Claim::new(text, ClaimKind::Event, "", ClaimValue::Statement)
    }

    #[test]
    fn test_combine_prefers_support_over_contradiction() {
        let c = claim("x");
        let result = ClaimVerification::combine(
            c.clone(),
            vec![
                SourceVerification::failed(c.id, "analyst", "e", "d", "195"),
                SourceVerification::verified(c.id, "news", "e"),
            ],
        );
        assert_eq!(result.status, VerificationStatus::Verified);
    }

    #[test]
    fn test_combine_failed_and_uncertain() {
        let c = claim("x");
        let failed = ClaimVerification::combine(
            c.clone(),
            vec![
                SourceVerification::uncertain(c.id, "filings"),
                SourceVerification::failed(c.id, "analyst", "e", "d", "195"),
            ],
        );
        assert_eq!(failed.status, VerificationStatus::Failed);

        let uncertain = ClaimVerification::combine(c.clone(), vec![SourceVerification::uncertain(c.id, "filings")]);
        assert_eq!(uncertain.status, VerificationStatus::Uncertain);

        let nothing = ClaimVerification::combine(c, Vec::new());
        assert_eq!(nothing.status, VerificationStatus::Uncertain);
    }

    #[test]
    fn test_zero_claims_is_vacuous_pass() {
        let verification = TierVerification::from_claims(Vec::new());
        assert_eq!(verification.pass_rate, 1.0);
        assert!(verification.vacuous);
        assert!(verification.passes(0.95));
    }

    #[test]
    fn test_pass_rate_counts_all_sources_once() {
        let a = claim("a");
        let b = claim("b");
        let verification = TierVerification::from_claims(vec![
            ClaimVerification::combine(
                a.clone(),
                vec![
                    SourceVerification::verified(a.id, "filings", "e"),
                    SourceVerification::verified(a.id, "news", "e"),
                ],
            ),
            ClaimVerification::combine(b.clone(), vec![SourceVerification::failed(b.id, "analyst", "e", "d", "1")]),
        ]);

        assert_eq!(verification.total(), 2);
        assert_eq!(verification.pass_rate, 0.5);
        assert_eq!(verification.contradiction_count(), 1);
        assert!(!verification.vacuous);
        assert!(!verification.passes(0.95));
        assert_eq!(verification.unverified().count(), 1);
    }
}
