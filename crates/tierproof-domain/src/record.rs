//! Unit and batch records handed to persistence

use crate::artifact::{TierArtifact, TierStatus};
use crate::risk::{RiskBucket, RiskScore};
use crate::source::AdapterStatus;
use crate::tier::Tier;
use crate::unit::{RunId, Unit};
use crate::verification::TierVerification;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal status of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// All three tiers passed
    Passed,
    /// At least one tier exhausted its attempts
    PartiallyFailed,
    /// The unit pipeline failed (panic, persistence failure)
    Errored,
    /// Never started because the batch was cancelled
    Skipped,
}

impl UnitStatus {
    /// Status of a unit whose three tiers reached a terminal state
    pub fn from_tiers<'a>(statuses: impl IntoIterator<Item = &'a TierStatus>) -> Self {
        let mut any = false;
        for status in statuses {
            any = true;
            if *status != TierStatus::Passed {
                return UnitStatus::PartiallyFailed;
            }
        }
        if any {
            UnitStatus::Passed
        } else {
            UnitStatus::PartiallyFailed
        }
    }

    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitStatus::Passed => "passed",
            UnitStatus::PartiallyFailed => "partially_failed",
            UnitStatus::Errored => "errored",
            UnitStatus::Skipped => "skipped",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "passed" => Some(UnitStatus::Passed),
            "partially_failed" => Some(UnitStatus::PartiallyFailed),
            "errored" => Some(UnitStatus::Errored),
            "skipped" => Some(UnitStatus::Skipped),
            _ => None,
        }
    }
}

/// Counters for one tier's attempts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptStats {
    /// Generation calls that failed or timed out
    pub generation_failures: u32,
    /// Attempts rejected for word count
    pub length_retries: u32,
    /// Extraction calls that failed (treated as zero claims)
    pub extraction_failures: u32,
    /// Verifications that passed with zero claims
    pub vacuous_passes: u32,
}

/// Final state of one tier, as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierOutcome {
    /// The terminal artifact
    pub artifact: TierArtifact,
    /// Verification of the last verified attempt
    pub verification: Option<TierVerification>,
    /// Risk score of the last verified attempt
    pub risk: Option<RiskScore>,
    /// Attempt counters
    pub stats: AttemptStats,
}

impl TierOutcome {
    /// Tier of this outcome
    pub fn tier(&self) -> Tier {
        self.artifact.tier
    }

    /// Whether the final pass rate was vacuous
    pub fn vacuous(&self) -> bool {
        self.artifact.status == TierStatus::Passed && self.verification.as_ref().is_some_and(|v| v.vacuous)
    }
}

/// Per-provider ingestion summary kept with the unit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    /// Provider tag
    pub provider: String,
    /// Reported status
    pub status: AdapterStatus,
    /// Documents returned
    pub document_count: usize,
    /// Failure reason
    pub error: Option<String>,
}

/// Everything persisted for one unit in a single write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    /// The unit
    pub unit: Unit,
    /// Overall status (`passed` only if all tiers passed)
    pub status: UnitStatus,
    /// One outcome per tier, in tier order
    pub tiers: Vec<TierOutcome>,
    /// Ingestion summary per provider
    pub sources: Vec<SourceSummary>,
    /// When the unit finished
    pub completed_at: DateTime<Utc>,
}

impl UnitRecord {
    /// Build a record, deriving the unit status from the tier outcomes
    pub fn new(unit: Unit, tiers: Vec<TierOutcome>, sources: Vec<SourceSummary>) -> Self {
        let status = UnitStatus::from_tiers(tiers.iter().map(|t| &t.artifact.status));
        Self {
            unit,
            status,
            tiers,
            sources,
            completed_at: Utc::now(),
        }
    }

    /// Attempts consumed across all tiers
    pub fn total_attempts(&self) -> u32 {
        self.tiers.iter().map(|t| t.artifact.attempt_count).sum()
    }

    /// Terminal summary for the orchestrator
    pub fn outcome(&self) -> UnitOutcome {
        UnitOutcome {
            unit_id: self.unit.id.clone(),
            status: self.status,
            attempts: self.total_attempts(),
            tiers: self
                .tiers
                .iter()
                .map(|t| TierSummary {
                    tier: t.tier(),
                    status: t.artifact.status,
                    attempts: t.artifact.attempt_count,
                    pass_rate: t.verification.as_ref().map(|v| v.pass_rate),
                    risk_bucket: t.risk.map(|r| r.bucket),
                    needs_review: t.artifact.needs_review,
                    vacuous: t.vacuous(),
                    stats: t.stats,
                })
                .collect(),
            error: self.tiers.iter().find_map(|t| t.artifact.last_error.clone()),
        }
    }
}

/// Compact per-tier summary carried in a unit outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSummary {
    /// Tier
    pub tier: Tier,
    /// Terminal status
    pub status: TierStatus,
    /// Attempts used
    pub attempts: u32,
    /// Final pass rate
    pub pass_rate: Option<f64>,
    /// Final risk bucket
    pub risk_bucket: Option<RiskBucket>,
    /// Routed to human review
    pub needs_review: bool,
    /// Passed with zero claims
    pub vacuous: bool,
    /// Attempt counters
    pub stats: AttemptStats,
}

/// Terminal summary of one unit, as read by the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOutcome {
    /// Unit identifier
    pub unit_id: String,
    /// Terminal status
    pub status: UnitStatus,
    /// Attempts consumed across tiers
    pub attempts: u32,
    /// Per-tier summaries (empty for errored or skipped units)
    pub tiers: Vec<TierSummary>,
    /// Last error message, if any
    pub error: Option<String>,
}

impl UnitOutcome {
    /// Outcome for a unit whose pipeline failed
    pub fn errored(unit_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            status: UnitStatus::Errored,
            attempts: 0,
            tiers: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Outcome for a unit that never started
    pub fn skipped(unit_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            status: UnitStatus::Skipped,
            attempts: 0,
            tiers: Vec::new(),
            error: None,
        }
    }
}

/// Aggregate audit record of one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRunRecord {
    /// Run identifier
    pub run_id: RunId,
    /// When the batch started
    pub started_at: DateTime<Utc>,
    /// When the batch was finalized
    pub finished_at: Option<DateTime<Utc>>,
    /// Units submitted to the batch
    pub total_units: usize,
    /// Units whose tiers all passed
    pub passed: usize,
    /// Units with at least one exhausted tier
    pub partially_failed: usize,
    /// Units whose pipeline failed
    pub errored: usize,
    /// Units never started because of cancellation
    pub skipped: usize,
    /// Attempts consumed across all units
    pub total_attempts: u64,
    /// Whether the run was cancelled
    pub cancelled: bool,
    /// Terminal outcome per unit
    pub outcomes: Vec<UnitOutcome>,
}

impl BatchRunRecord {
    /// Open a record at batch start
    pub fn new(run_id: RunId, total_units: usize) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            finished_at: None,
            total_units,
            passed: 0,
            partially_failed: 0,
            errored: 0,
            skipped: 0,
            total_attempts: 0,
            cancelled: false,
            outcomes: Vec::with_capacity(total_units),
        }
    }

    /// Add one unit's terminal outcome
    pub fn record(&mut self, outcome: UnitOutcome) {
        match outcome.status {
            UnitStatus::Passed => self.passed += 1,
            UnitStatus::PartiallyFailed => self.partially_failed += 1,
            UnitStatus::Errored => self.errored += 1,
            UnitStatus::Skipped => self.skipped += 1,
        }
        self.total_attempts += u64::from(outcome.attempts);
        self.outcomes.push(outcome);
    }

    /// Close the record; outcomes are sorted by unit id
    pub fn finalize(mut self, cancelled: bool) -> Self {
        self.cancelled = cancelled;
        self.finished_at = Some(Utc::now());
        self.outcomes.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));
        self
    }

    /// Whether `finalize` was called
    pub fn is_finalized(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Units that actually ran
    pub fn attempted(&self) -> usize {
        self.passed + self.partially_failed + self.errored
    }

    /// errored / attempted (0.0 when nothing ran)
    pub fn error_rate(&self) -> f64 {
        let attempted = self.attempted();
        if attempted == 0 {
            0.0
        } else {
            self.errored as f64 / attempted as f64
        }
    }

    /// Outcomes that did not pass, for reporting
    pub fn failures(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, UnitStatus::PartiallyFailed | UnitStatus::Errored))
    }
}
