//! Metrics collected over a batch run

use std::collections::HashMap;
use tierproof_domain::{Tier, TierStatus, TierSummary, UnitOutcome, UnitStatus};

/// Per-tier counters for one batch run
///
/// Vacuous passes are counted apart from verified passes so a run where
/// nothing was checked can be told apart from a clean one.
#[derive(Debug, Clone, Default)]
pub struct BatchMetrics {
    /// Tiers that passed, per tier
    pub passed: HashMap<Tier, usize>,

    /// Tiers that used up their attempts
    pub exhausted: HashMap<Tier, usize>,

    /// Passes with zero extracted claims
    pub vacuous: HashMap<Tier, usize>,

    /// Tiers routed to human review
    pub review: HashMap<Tier, usize>,

    /// Generation calls that failed or timed out
    pub generation_failures: HashMap<Tier, usize>,

    /// Extraction calls that failed
    pub extraction_failures: HashMap<Tier, usize>,

    /// Attempts rejected for word count
    pub length_retries: HashMap<Tier, usize>,

    /// Units that reached a terminal tier state for every tier
    pub units_completed: usize,

    /// Units whose pipeline failed
    pub units_errored: usize,

    /// Units never started
    pub units_skipped: usize,

    /// Wall-clock duration of the run in milliseconds
    pub total_runtime_ms: u64,
}

impl BatchMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a unit's terminal outcome
    pub fn record_unit(&mut self, outcome: &UnitOutcome) {
        match outcome.status {
            UnitStatus::Passed | UnitStatus::PartiallyFailed => self.units_completed += 1,
            UnitStatus::Errored => self.units_errored += 1,
            UnitStatus::Skipped => self.units_skipped += 1,
        }
        for tier in &outcome.tiers {
            self.record_tier(tier);
        }
    }

    /// Record one tier summary
    pub fn record_tier(&mut self, summary: &TierSummary) {
        let tier = summary.tier;
        match summary.status {
            TierStatus::Passed => bump(&mut self.passed, tier, 1),
            TierStatus::Exhausted => bump(&mut self.exhausted, tier, 1),
            _ => {}
        }
        if summary.vacuous {
            bump(&mut self.vacuous, tier, 1);
        }
        if summary.needs_review {
            bump(&mut self.review, tier, 1);
        }
        bump(&mut self.generation_failures, tier, summary.stats.generation_failures as usize);
        bump(&mut self.extraction_failures, tier, summary.stats.extraction_failures as usize);
        bump(&mut self.length_retries, tier, summary.stats.length_retries as usize);
    }

    /// Get total passes across all tiers
    pub fn total_passed(&self) -> usize {
        self.passed.values().sum()
    }

    /// Get total exhausted tiers
    pub fn total_exhausted(&self) -> usize {
        self.exhausted.values().sum()
    }

    /// Get total vacuous passes
    pub fn total_vacuous(&self) -> usize {
        self.vacuous.values().sum()
    }

    /// Share of verified tiers that passed with zero claims
    pub fn vacuous_rate(&self) -> f64 {
        let verified = self.total_passed() + self.total_exhausted();
        if verified == 0 {
            0.0
        } else {
            self.total_vacuous() as f64 / verified as f64
        }
    }

    /// Whether the vacuous-pass rate is above `ratio`
    pub fn vacuous_alarm(&self, ratio: f64) -> bool {
        self.total_vacuous() > 0 && self.vacuous_rate() > ratio
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Batch Metrics Summary".to_string(),
            "=====================".to_string(),
            format!("Units completed: {}", self.units_completed),
            format!("Units errored: {}", self.units_errored),
            format!("Units skipped: {}", self.units_skipped),
            format!("Total runtime: {}ms", self.total_runtime_ms),
            String::new(),
            format!(
                "{:<10} {:>7} {:>10} {:>9} {:>7} {:>8} {:>8} {:>7}",
                "tier", "passed", "exhausted", "vacuous", "review", "gen err", "ext err", "length"
            ),
        ];

        for tier in Tier::ALL {
            lines.push(format!(
                "{:<10} {:>7} {:>10} {:>9} {:>7} {:>8} {:>8} {:>7}",
                tier.as_str(),
                count(&self.passed, tier),
                count(&self.exhausted, tier),
                count(&self.vacuous, tier),
                count(&self.review, tier),
                count(&self.generation_failures, tier),
                count(&self.extraction_failures, tier),
                count(&self.length_retries, tier),
            ));
        }

        if self.total_vacuous() > 0 {
            lines.push(String::new());
            lines.push(format!(
                "Vacuous passes: {} of {} verified tiers ({:.0}%)",
                self.total_vacuous(),
                self.total_passed() + self.total_exhausted(),
                self.vacuous_rate() * 100.0
            ));
        }

        lines.join("\n")
    }
}

fn bump(map: &mut HashMap<Tier, usize>, tier: Tier, by: usize) {
    if by > 0 {
        *map.entry(tier).or_insert(0) += by;
    }
}

fn count(map: &HashMap<Tier, usize>, tier: Tier) -> usize {
    map.get(&tier).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierproof_domain::AttemptStats;

    fn summary(tier: Tier, status: TierStatus, vacuous: bool) -> TierSummary {
        TierSummary {
            tier,
            status,
            attempts: 1,
            pass_rate: Some(1.0),
            risk_bucket: None,
            needs_review: status == TierStatus::Exhausted,
            vacuous,
            stats: AttemptStats {
                vacuous_passes: u32::from(vacuous),
                ..AttemptStats::default()
            },
        }
    }

    fn outcome(tiers: Vec<TierSummary>) -> UnitOutcome {
        let status = if tiers.iter().all(|t| t.status == TierStatus::Passed) {
            UnitStatus::Passed
        } else {
            UnitStatus::PartiallyFailed
        };
        UnitOutcome {
            unit_id: "TICK".to_string(),
            status,
            attempts: tiers.len() as u32,
            tiers,
            error: None,
        }
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = BatchMetrics::new();
        assert_eq!(metrics.total_passed(), 0);
        assert_eq!(metrics.vacuous_rate(), 0.0);
        assert!(!metrics.vacuous_alarm(0.5));
    }

    #[test]
    fn test_record_unit() {
        let mut metrics = BatchMetrics::new();
        metrics.record_unit(&outcome(vec![
            summary(Tier::Brief, TierStatus::Passed, true),
            summary(Tier::Medium, TierStatus::Exhausted, false),
            summary(Tier::Expanded, TierStatus::Passed, false),
        ]));
        metrics.record_unit(&UnitOutcome::errored("ACME", "disk full"));
        metrics.record_unit(&UnitOutcome::skipped("ZED"));

        assert_eq!(metrics.total_passed(), 2);
        assert_eq!(metrics.total_exhausted(), 1);
        assert_eq!(*metrics.vacuous.get(&Tier::Brief).unwrap(), 1);
        assert_eq!(*metrics.review.get(&Tier::Medium).unwrap(), 1);
        assert_eq!(metrics.units_completed, 1);
        assert_eq!(metrics.units_errored, 1);
        assert_eq!(metrics.units_skipped, 1);
    }

    #[test]
    fn test_vacuous_alarm() {
        let mut metrics = BatchMetrics::new();
        metrics.record_unit(&outcome(vec![
            summary(Tier::Brief, TierStatus::Passed, true),
            summary(Tier::Medium, TierStatus::Passed, true),
            summary(Tier::Expanded, TierStatus::Passed, false),
        ]));

        assert!((metrics.vacuous_rate() - 2.0 / 3.0).abs() < 1e-9);
        assert!(metrics.vacuous_alarm(0.5));
        assert!(!metrics.vacuous_alarm(0.75));
    }

    #[test]
    fn test_summary() {
        let mut metrics = BatchMetrics::new();
        metrics.record_unit(&outcome(vec![summary(Tier::Brief, TierStatus::Passed, true)]));
        metrics.total_runtime_ms = 1200;

        let summary = metrics.summary();
        assert!(summary.contains("Units completed: 1"));
        assert!(summary.contains("Total runtime: 1200ms"));
        assert!(summary.contains("brief"));
        assert!(summary.contains("Vacuous passes: 1 of 1 verified tiers (100%)"));
    }
}
