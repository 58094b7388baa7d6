//! Retry controller
//!
//! Decides what happens after each verified attempt and writes the
//! corrective instruction handed to the next generation call. The attempt
//! counter itself lives on the [`TierArtifact`]; this module only reads it.

use std::fmt::Write;
use tierproof_domain::{
    CorrectionKind, CorrectiveInstruction, GenerationError, Tier, TierArtifact, TierVerification, VerificationStatus,
    WordRange,
};

/// Closing directive of every corrective instruction
pub const SOURCE_ONLY_DIRECTIVE: &str = "Use only facts present in source data.";

/// Outcome of a verified attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// Pass rate met; the artifact is done
    Pass,
    /// Pass rate missed with attempts left
    Regenerate(CorrectiveInstruction),
    /// Pass rate missed on the last attempt
    Exhaust(CorrectiveInstruction),
}

/// Bounded retry policy for one tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryController {
    pass_threshold: f64,
}

impl RetryController {
    /// Create a controller with the tier pass threshold
    pub fn new(pass_threshold: f64) -> Self {
        Self { pass_threshold }
    }

    /// Decide after the current attempt of `artifact` was verified
    pub fn decide(&self, artifact: &TierArtifact, verification: &TierVerification) -> RetryDecision {
        if verification.passes(self.pass_threshold) {
            return RetryDecision::Pass;
        }
        let instruction = self.fact_check(artifact.attempt_count, verification);
        if artifact.attempt_count < artifact.max_attempts {
            RetryDecision::Regenerate(instruction)
        } else {
            RetryDecision::Exhaust(instruction)
        }
    }

    /// Instruction listing every claim that did not verify
    pub fn fact_check(&self, attempt: u32, verification: &TierVerification) -> CorrectiveInstruction {
        let mut text = String::new();
        let _ = writeln!(
            text,
            "Attempt {} failed fact-check: {} of {} claims verified ({:.0}%, {:.0}% required).",
            attempt,
            verification.verified,
            verification.total(),
            verification.pass_rate * 100.0,
            self.pass_threshold * 100.0
        );

        for claim in verification.unverified() {
            match claim.status {
                VerificationStatus::Failed => {
                    let _ = write!(text, "- You wrote \"{}\".", claim.claim.text);
                    if let Some(source) = claim.contradictions().next() {
                        if let Some(discrepancy) = &source.discrepancy {
                            let _ = write!(text, " This is wrong: {}.", discrepancy);
                        }
                        if let Some(expected) = &source.expected {
                            let _ = write!(text, " The correct value is {} (source: {}).", expected, source.provider);
                        }
                    }
                    text.push('\n');
                }
                _ => {
                    let _ = writeln!(
                        text,
                        "- You wrote \"{}\". No source supports this; remove it or replace it with a sourced fact.",
                        claim.claim.text
                    );
                }
            }
        }

        text.push_str(SOURCE_ONLY_DIRECTIVE);
        CorrectiveInstruction::new(attempt, CorrectionKind::FactCheck, text)
    }

    /// Instruction for a candidate outside the tier's word range
    pub fn length(&self, attempt: u32, tier: Tier, words: usize, range: WordRange) -> CorrectiveInstruction {
        let direction = if words < range.min { "too short" } else { "too long" };
        CorrectiveInstruction::new(
            attempt,
            CorrectionKind::Length,
            format!(
                "Attempt {} was {} words, {} for the {} tier. Rewrite it to {}. {}",
                attempt, words, direction, tier, range, SOURCE_ONLY_DIRECTIVE
            ),
        )
    }

    /// Instruction after a failed or timed-out generation call
    pub fn generation(&self, attempt: u32, error: &GenerationError) -> CorrectiveInstruction {
        CorrectiveInstruction::new(
            attempt,
            CorrectionKind::Generation,
            format!("Attempt {} produced no text ({}). {}", attempt, error, SOURCE_ONLY_DIRECTIVE),
        )
    }
}

impl Default for RetryController {
    fn default() -> Self {
        Self::new(0.95)
    }
}
