//! Tier artifact module - one tier's evolving work product
//!
//! The artifact is an explicit bounded state machine:
//!
//! ```text
//! generating -> verifying -> passed
//!      ^            |
//!      |            v
//! regenerating <----+----> exhausted
//! ```
//!
//! Every method that changes state checks the transition and refuses to touch
//! a terminal artifact. `attempt_count` can never exceed `max_attempts`.

use crate::tier::Tier;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of a tier artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierStatus {
    /// Waiting for (or running) a generation call
    Generating,
    /// Candidate text is being verified
    Verifying,
    /// Verification passed (terminal)
    Passed,
    /// Last attempt failed; another will be made
    Regenerating,
    /// Attempt budget spent without passing (terminal)
    Exhausted,
}

impl TierStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TierStatus::Generating => "generating",
            TierStatus::Verifying => "verifying",
            TierStatus::Passed => "passed",
            TierStatus::Regenerating => "regenerating",
            TierStatus::Exhausted => "exhausted",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "generating" => Some(TierStatus::Generating),
            "verifying" => Some(TierStatus::Verifying),
            "passed" => Some(TierStatus::Passed),
            "regenerating" => Some(TierStatus::Regenerating),
            "exhausted" => Some(TierStatus::Exhausted),
            _ => None,
        }
    }

    /// Whether the status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, TierStatus::Passed | TierStatus::Exhausted)
    }
}

/// Why an attempt was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionKind {
    /// Verification pass rate below threshold
    FactCheck,
    /// Word count outside the tier's range
    Length,
    /// The generation call failed or timed out
    Generation,
}

impl CorrectionKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionKind::FactCheck => "fact_check",
            CorrectionKind::Length => "length",
            CorrectionKind::Generation => "generation",
        }
    }

    /// Parse a kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fact_check" => Some(CorrectionKind::FactCheck),
            "length" => Some(CorrectionKind::Length),
            "generation" => Some(CorrectionKind::Generation),
            _ => None,
        }
    }
}

/// Corrective instruction produced for one failed attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectiveInstruction {
    /// The attempt that failed (1-based)
    pub attempt: u32,
    /// Why the attempt was rejected
    pub kind: CorrectionKind,
    /// Instruction text handed to the next generation call
    pub text: String,
}

impl CorrectiveInstruction {
    /// Create a new instruction
    pub fn new(attempt: u32, kind: CorrectionKind, text: impl Into<String>) -> Self {
        Self {
            attempt,
            kind,
            text: text.into(),
        }
    }
}

/// Illegal state machine operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The artifact already reached a terminal state
    #[error("{tier} artifact is terminal ({status}) and cannot change")]
    Terminal {
        /// Tier of the artifact
        tier: Tier,
        /// Its terminal status
        status: &'static str,
    },

    /// Transition not allowed from the current state
    #[error("{tier} artifact cannot {action} while {status}")]
    Invalid {
        /// Tier of the artifact
        tier: Tier,
        /// Attempted action
        action: &'static str,
        /// Current status
        status: &'static str,
    },

    /// No attempts left
    #[error("{tier} artifact has used all {max} attempts")]
    BudgetSpent {
        /// Tier of the artifact
        tier: Tier,
        /// Attempt budget
        max: u32,
    },
}

/// One tier's evolving work product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierArtifact {
    /// Tier this artifact belongs to
    pub tier: Tier,
    /// Latest candidate text (empty until the first successful generation)
    pub text: String,
    /// Word count of `text`
    pub word_count: usize,
    /// Current status
    pub status: TierStatus,
    /// Attempts started so far
    pub attempt_count: u32,
    /// Attempt budget
    pub max_attempts: u32,
    /// One instruction per failed attempt, in order
    pub corrections: Vec<CorrectiveInstruction>,
    /// Routed to human review
    pub needs_review: bool,
    /// Message of the most recent generation failure, if any
    pub last_error: Option<String>,
}

impl TierArtifact {
    /// Create a fresh artifact in `generating` with no attempts made
    pub fn new(tier: Tier, max_attempts: u32) -> Self {
        Self {
            tier,
            text: String::new(),
            word_count: 0,
            status: TierStatus::Generating,
            attempt_count: 0,
            max_attempts: max_attempts.max(1),
            corrections: Vec::new(),
            needs_review: false,
            last_error: None,
        }
    }

    /// Whether the artifact reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn guard(&self, action: &'static str, allowed: &[TierStatus]) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal {
                tier: self.tier,
                status: self.status.as_str(),
            });
        }
        if !allowed.contains(&self.status) {
            return Err(TransitionError::Invalid {
                tier: self.tier,
                action,
                status: self.status.as_str(),
            });
        }
        Ok(())
    }

    /// Start a new generation attempt and return its 1-based number
    pub fn begin_attempt(&mut self) -> Result<u32, TransitionError> {
        self.guard("begin an attempt", &[TierStatus::Generating, TierStatus::Regenerating])?;
        if self.status == TierStatus::Generating && self.attempt_count > 0 {
            return Err(TransitionError::Invalid {
                tier: self.tier,
                action: "begin an attempt",
                status: "generating",
            });
        }
        if self.attempt_count >= self.max_attempts {
            return Err(TransitionError::BudgetSpent {
                tier: self.tier,
                max: self.max_attempts,
            });
        }
        self.attempt_count += 1;
        self.status = TierStatus::Generating;
        Ok(self.attempt_count)
    }

    /// Record candidate text from the current attempt and move to `verifying`
    pub fn record_candidate(&mut self, text: impl Into<String>, word_count: usize) -> Result<(), TransitionError> {
        self.guard("record a candidate", &[TierStatus::Generating])?;
        if self.attempt_count == 0 {
            return Err(TransitionError::Invalid {
                tier: self.tier,
                action: "record a candidate",
                status: "generating",
            });
        }
        self.text = text.into();
        self.word_count = word_count;
        self.status = TierStatus::Verifying;
        Ok(())
    }

    /// Record a failed generation call for the current attempt
    pub fn record_generation_error(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        self.guard("record a generation error", &[TierStatus::Generating])?;
        self.last_error = Some(message.into());
        Ok(())
    }

    /// Accept the current candidate; `needs_review` comes from the risk bucket
    pub fn pass(&mut self, needs_review: bool) -> Result<(), TransitionError> {
        self.guard("pass", &[TierStatus::Verifying])?;
        self.status = TierStatus::Passed;
        self.needs_review = needs_review;
        Ok(())
    }

    /// Reject the current attempt
    ///
    /// Appends the instruction, then moves to `regenerating` when attempts
    /// remain or to `exhausted` (flagged for review) when the budget is spent.
    pub fn reject(&mut self, instruction: CorrectiveInstruction) -> Result<TierStatus, TransitionError> {
        self.guard("reject", &[TierStatus::Generating, TierStatus::Verifying])?;
        if self.attempt_count == 0 {
            return Err(TransitionError::Invalid {
                tier: self.tier,
                action: "reject",
                status: self.status.as_str(),
            });
        }
        self.corrections.push(instruction);
        if self.attempt_count < self.max_attempts {
            self.status = TierStatus::Regenerating;
        } else {
            self.status = TierStatus::Exhausted;
            self.needs_review = true;
        }
        Ok(self.status)
    }

    /// Corrective instruction texts, in order
    pub fn correction_texts(&self) -> Vec<String> {
        self.corrections.iter().map(|c| c.text.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fact_check(attempt: u32) -> CorrectiveInstruction {
        CorrectiveInstruction::new(attempt, CorrectionKind::FactCheck, "fix it")
    }

    #[test]
    fn test_happy_path() {
        let mut artifact = TierArtifact::new(Tier::Brief, 5);
        assert_eq!(artifact.begin_attempt().unwrap(), 1);
        artifact.record_candidate("Tick Corp earned $5.2 billion", 5).unwrap();
        assert_eq!(artifact.status, TierStatus::Verifying);
        artifact.pass(false).unwrap();

        assert_eq!(artifact.status, TierStatus::Passed);
        assert_eq!(artifact.attempt_count, 1);
        assert!(artifact.corrections.is_empty());
    }

    #[test]
    fn test_terminal_artifact_is_immutable() {
        let mut artifact = TierArtifact::new(Tier::Medium, 5);
        artifact.begin_attempt().unwrap();
        artifact.record_candidate("text", 1).unwrap();
        artifact.pass(false).unwrap();

        assert!(matches!(artifact.begin_attempt(), Err(TransitionError::Terminal { .. })));
        assert!(matches!(artifact.reject(fact_check(1)), Err(TransitionError::Terminal { .. })));
        assert!(matches!(artifact.record_candidate("x", 1), Err(TransitionError::Terminal { .. })));
        assert_eq!(artifact.text, "text");
    }

    #[test]
    fn test_exhaustion_keeps_text_and_corrections() {
        let mut artifact = TierArtifact::new(Tier::Expanded, 3);
        for attempt in 1..=3 {
            assert_eq!(artifact.begin_attempt().unwrap(), attempt);
            artifact.record_candidate(format!("attempt {}", attempt), 2).unwrap();
            let status = artifact.reject(fact_check(attempt)).unwrap();
            if attempt < 3 {
                assert_eq!(status, TierStatus::Regenerating);
            } else {
                assert_eq!(status, TierStatus::Exhausted);
            }
        }

        assert!(artifact.needs_review);
        assert_eq!(artifact.text, "attempt 3");
        assert_eq!(artifact.corrections.len(), 3);
        assert!(matches!(artifact.begin_attempt(), Err(TransitionError::Terminal { .. })));
    }

    #[test]
    fn test_generation_failure_rejects_from_generating() {
        let mut artifact = TierArtifact::new(Tier::Brief, 5);
        artifact.begin_attempt().unwrap();
        artifact.record_generation_error("timed out").unwrap();
        let status = artifact
            .reject(CorrectiveInstruction::new(1, CorrectionKind::Generation, "try again"))
            .unwrap();

        assert_eq!(status, TierStatus::Regenerating);
        assert_eq!(artifact.last_error.as_deref(), Some("timed out"));
        assert!(artifact.text.is_empty());
    }

    #[test]
    fn test_invalid_transitions() {
        let mut artifact = TierArtifact::new(Tier::Brief, 5);
        assert!(artifact.pass(false).is_err());
        assert!(artifact.reject(fact_check(0)).is_err());
        assert!(artifact.record_candidate("early", 1).is_err());

        artifact.begin_attempt().unwrap();
        assert!(artifact.begin_attempt().is_err());
    }

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Pass,
        FailGeneration,
        FailVerification,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![Just(Step::Pass), Just(Step::FailGeneration), Just(Step::FailVerification)]
    }

    proptest! {
        #[test]
        fn prop_attempt_count_never_exceeds_budget(
            max in 1u32..8,
            steps in proptest::collection::vec(step(), 0..20),
        ) {
            let mut artifact = TierArtifact::new(Tier::Medium, max);
            for s in steps {
                if artifact.is_terminal() {
                    break;
                }
                let attempt = artifact.begin_attempt().unwrap();
                prop_assert!(artifact.attempt_count <= max);
                match s {
                    Step::Pass => {
                        artifact.record_candidate("ok", 1).unwrap();
                        artifact.pass(false).unwrap();
                    }
                    Step::FailGeneration => {
                        artifact.record_generation_error("boom").unwrap();
                        artifact.reject(CorrectiveInstruction::new(attempt, CorrectionKind::Generation, "again")).unwrap();
                    }
                    Step::FailVerification => {
                        artifact.record_candidate("bad", 1).unwrap();
                        artifact.reject(fact_check(attempt)).unwrap();
                    }
                }
                prop_assert!(artifact.attempt_count <= max);
                prop_assert_eq!(artifact.corrections.len() as u32 + u32::from(artifact.status == TierStatus::Passed), artifact.attempt_count);
            }
            if artifact.status == TierStatus::Exhausted {
                prop_assert_eq!(artifact.attempt_count, max);
                prop_assert!(artifact.needs_review);
            }
        }
    }
}
