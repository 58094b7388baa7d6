//! Per-tier generate, verify and retry loop

use chrono::NaiveDate;
use std::sync::Arc;
use tierproof_domain::text::word_count;
use tierproof_domain::{
    AssembledContext, AttemptStats, ClaimExtractor, GenerationError, GenerationProvider, GenerationRequest,
    SourceBundle, Tier, TierArtifact, TierOutcome,
};
use tierproof_verifier::{RiskScorer, Verifier};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::retry::{RetryController, RetryDecision};

/// Runs one tier's bounded state machine to a terminal state
///
/// Cheap to clone; every tier task gets its own copy.
#[derive(Clone)]
pub struct TierRunner {
    generator: Arc<dyn GenerationProvider>,
    extractor: Arc<dyn ClaimExtractor>,
    verifier: Arc<Verifier>,
    scorer: Arc<RiskScorer>,
    retry: RetryController,
    config: Arc<PipelineConfig>,
    as_of: NaiveDate,
}

impl TierRunner {
    /// Create a runner; `as_of` is the date beyond which mentioned dates are impossible
    pub fn new(
        generator: Arc<dyn GenerationProvider>,
        extractor: Arc<dyn ClaimExtractor>,
        verifier: Arc<Verifier>,
        scorer: Arc<RiskScorer>,
        config: Arc<PipelineConfig>,
        as_of: NaiveDate,
    ) -> Self {
        let retry = RetryController::new(verifier.config().pass_threshold);
        Self {
            generator,
            extractor,
            verifier,
            scorer,
            retry,
            config,
            as_of,
        }
    }

    /// Drive a tier until it passes or exhausts its attempts
    ///
    /// Generation failures, timeouts and out-of-range lengths each spend one
    /// attempt. The returned outcome carries the verification and risk score
    /// of the most recent attempt that reached verification; both are empty
    /// only when no attempt got that far.
    pub async fn run(
        &self,
        tier: Tier,
        context: &AssembledContext,
        sources: &SourceBundle,
    ) -> Result<TierOutcome, PipelineError> {
        let range = self.config.word_range(tier);
        let mut artifact = TierArtifact::new(tier, self.config.max_attempts);
        let mut stats = AttemptStats::default();
        let mut last_verified = None;

        while !artifact.is_terminal() {
            let attempt = artifact.begin_attempt()?;

            let request = GenerationRequest {
                tier,
                context: context.clone(),
                corrections: artifact.correction_texts(),
                word_range: range,
                attempt,
            };
            let generated = match timeout(self.config.generation_timeout(), self.generator.generate(&request)).await {
                Ok(result) => result,
                Err(_) => Err(GenerationError::Timeout(self.config.generation_timeout_ms)),
            };

            let text = match generated {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    warn!(tier = tier.as_str(), attempt, error = %e, "Generation failed");
                    stats.generation_failures += 1;
                    artifact.record_generation_error(e.to_string())?;
                    artifact.reject(self.retry.generation(attempt, &e))?;
                    continue;
                }
            };

            let words = word_count(&text);
            artifact.record_candidate(text.clone(), words)?;
            if !range.contains(words) {
                info!(tier = tier.as_str(), attempt, words, "Candidate outside word range");
                stats.length_retries += 1;
                artifact.reject(self.retry.length(attempt, tier, words, range))?;
                continue;
            }

            let claims = match self.extractor.extract(&text).await {
                Ok(claims) => claims,
                Err(e) => {
                    warn!(tier = tier.as_str(), attempt, error = %e, "Claim extraction failed, treating as zero claims");
                    stats.extraction_failures += 1;
                    Vec::new()
                }
            };

            let result = self.verifier.verify(claims, sources);
            let score = self.scorer.score(&text, &result, sources, self.as_of);
            debug!(
                tier = tier.as_str(),
                attempt,
                pass_rate = result.pass_rate,
                risk = score.score,
                "Attempt verified"
            );

            match self.retry.decide(&artifact, &result) {
                RetryDecision::Pass => {
                    if result.vacuous {
                        stats.vacuous_passes += 1;
                        warn!(tier = tier.as_str(), attempt, "No claims extracted; vacuous pass");
                    }
                    let review = self.scorer.needs_review(&score);
                    artifact.pass(review)?;
                    info!(
                        tier = tier.as_str(),
                        attempt,
                        pass_rate = result.pass_rate,
                        bucket = score.bucket.as_str(),
                        needs_review = review,
                        "Tier passed"
                    );
                }
                RetryDecision::Regenerate(instruction) => {
                    info!(tier = tier.as_str(), attempt, pass_rate = result.pass_rate, "Tier regenerating");
                    artifact.reject(instruction)?;
                }
                RetryDecision::Exhaust(instruction) => {
                    warn!(tier = tier.as_str(), attempt, pass_rate = result.pass_rate, "Tier exhausted its attempts");
                    artifact.reject(instruction)?;
                }
            }
            last_verified = Some((result, score));
        }

        let (verification, risk) = match last_verified {
            Some((verification, risk)) => (Some(verification), Some(risk)),
            None => (None, None),
        };
        Ok(TierOutcome {
            artifact,
            verification,
            risk,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tierproof_domain::{
        AmountUnit, Claim, ClaimKind, ClaimValue, CorrectionKind, DocumentKind, ExtractionError, FieldValue,
        SourceDocument, SourceFetch, TierStatus,
    };

    /// Generator returning canned texts in order, the last one repeating
    struct Canned {
        texts: Vec<Result<String, GenerationError>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl Canned {
        fn new(texts: Vec<Result<&str, GenerationError>>) -> Self {
            Self {
                texts: texts.into_iter().map(|t| t.map(str::to_string)).collect(),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl GenerationProvider for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.texts[call.min(self.texts.len() - 1)].clone()
        }
    }

    /// One numeric claim per "$N" token, subject "price target"
    struct PriceTargets;

    #[async_trait]
    impl ClaimExtractor for PriceTargets {
        async fn extract(&self, text: &str) -> Result<Vec<Claim>, ExtractionError> {
            if text.contains("unparseable") {
                return Err(ExtractionError::Parse("bad".to_string()));
            }
            Ok(text
                .split_whitespace()
                .filter_map(|w| w.trim_end_matches('.').strip_prefix('$'))
                .filter_map(|n| n.parse::<f64>().ok())
                .map(|value| {
                    Claim::new(
                        format!("price target of ${}", value),
                        ClaimKind::Numeric,
                        "price target",
                        ClaimValue::Amount {
                            value,
                            unit: AmountUnit::Currency,
                        },
                    )
                })
                .collect())
        }
    }

    fn sources() -> SourceBundle {
        let doc = SourceDocument::new(
            "analyst",
            DocumentKind::AnalystReport,
            Utc::now(),
            "Morgan Stanley set a price target of $195.",
        )
        .with_field("price_target", FieldValue::Number(195.0));
        SourceBundle::new(vec![SourceFetch::success("analyst", vec![doc])])
    }

    fn context() -> AssembledContext {
        AssembledContext {
            tier: Tier::Brief,
            unit_id: "TICK".to_string(),
            unit_name: "Tick Corp".to_string(),
            excerpts: Vec::new(),
            passages: Vec::new(),
            truncated: false,
        }
    }

    fn runner(generator: Canned, config: PipelineConfig) -> TierRunner {
        TierRunner::new(
            Arc::new(generator),
            Arc::new(PriceTargets),
            Arc::new(Verifier::default()),
            Arc::new(RiskScorer::default()),
            Arc::new(config),
            Utc::now().date_naive(),
        )
    }

    const GOOD: &str = "Analysts at the bank keep the price target at $195.";
    const WRONG: &str = "Analysts at the bank raised the price target to $200.";

    #[tokio::test]
    async fn test_passes_on_first_attempt() {
        let outcome = runner(Canned::new(vec![Ok(GOOD)]), PipelineConfig::default())
            .run(Tier::Brief, &context(), &sources())
            .await
            .unwrap();

        assert_eq!(outcome.artifact.status, TierStatus::Passed);
        assert_eq!(outcome.artifact.attempt_count, 1);
        assert!(outcome.artifact.corrections.is_empty());
        assert_eq!(outcome.verification.unwrap().pass_rate, 1.0);
        assert!(outcome.risk.is_some());
    }

    #[tokio::test]
    async fn test_fact_check_retry_then_pass() {
        let generator = Canned::new(vec![Ok(WRONG), Ok(GOOD)]);
        let outcome = runner(generator, PipelineConfig::default())
            .run(Tier::Brief, &context(), &sources())
            .await
            .unwrap();

        assert_eq!(outcome.artifact.status, TierStatus::Passed);
        assert_eq!(outcome.artifact.attempt_count, 2);
        assert_eq!(outcome.artifact.corrections.len(), 1);
        assert!(outcome.artifact.corrections[0].text.contains("$195"));
        assert_eq!(outcome.artifact.text, GOOD);
    }

    #[tokio::test]
    async fn test_exhausts_after_budget() {
        let outcome = runner(Canned::new(vec![Ok(WRONG)]), PipelineConfig::default())
            .run(Tier::Brief, &context(), &sources())
            .await
            .unwrap();

        assert_eq!(outcome.artifact.status, TierStatus::Exhausted);
        assert_eq!(outcome.artifact.attempt_count, 5);
        assert_eq!(outcome.artifact.corrections.len(), 5);
        assert!(outcome.artifact.needs_review);
        assert_eq!(outcome.artifact.text, WRONG);
        assert!(!outcome.verification.unwrap().passes(0.95));
    }

    #[tokio::test]
    async fn test_length_violation_spends_an_attempt() {
        let too_long = "Analysts at the bank keep the price target at $195 while the rest of the market debates.";
        let outcome = runner(Canned::new(vec![Ok(too_long), Ok(GOOD)]), PipelineConfig::default())
            .run(Tier::Brief, &context(), &sources())
            .await
            .unwrap();

        assert_eq!(outcome.artifact.status, TierStatus::Passed);
        assert_eq!(outcome.artifact.attempt_count, 2);
        assert_eq!(outcome.stats.length_retries, 1);
        assert_eq!(outcome.artifact.corrections[0].kind, CorrectionKind::Length);
    }

    #[tokio::test]
    async fn test_generation_error_and_timeout_count_as_attempts() {
        let generator = Canned::new(vec![Err(GenerationError::Backend("down".to_string())), Ok(GOOD)]);
        let outcome = runner(generator, PipelineConfig::default())
            .run(Tier::Brief, &context(), &sources())
            .await
            .unwrap();
        assert_eq!(outcome.artifact.attempt_count, 2);
        assert_eq!(outcome.stats.generation_failures, 1);
        assert_eq!(outcome.artifact.last_error.as_deref(), Some("Generation back end error: down"));

        let mut slow = Canned::new(vec![Ok(GOOD)]);
        slow.delay = Some(Duration::from_millis(200));
        let config = PipelineConfig {
            generation_timeout_ms: 10,
            max_attempts: 2,
            ..PipelineConfig::default()
        };
        let outcome = runner(slow, config).run(Tier::Brief, &context(), &sources()).await.unwrap();
        assert_eq!(outcome.artifact.status, TierStatus::Exhausted);
        assert_eq!(outcome.stats.generation_failures, 2);
        assert!(outcome.verification.is_none());
        assert!(outcome
            .artifact
            .corrections
            .iter()
            .all(|c| c.kind == CorrectionKind::Generation));
    }

    #[tokio::test]
    async fn test_unverified_last_attempt_keeps_earlier_verification() {
        let too_long = "Analysts at the bank keep the price target at $195 while the rest of the market debates.";
        let config = PipelineConfig {
            max_attempts: 2,
            ..PipelineConfig::default()
        };
        let outcome = runner(Canned::new(vec![Ok(WRONG), Ok(too_long)]), config)
            .run(Tier::Brief, &context(), &sources())
            .await
            .unwrap();

        assert_eq!(outcome.artifact.status, TierStatus::Exhausted);
        assert_eq!(outcome.artifact.text, too_long);
        assert!(!outcome.verification.unwrap().passes(0.95));
        assert!(outcome.risk.is_some());

        let generator = Canned::new(vec![Ok(WRONG), Err(GenerationError::Backend("down".to_string()))]);
        let config = PipelineConfig {
            max_attempts: 2,
            ..PipelineConfig::default()
        };
        let outcome = runner(generator, config).run(Tier::Brief, &context(), &sources()).await.unwrap();
        assert_eq!(outcome.artifact.status, TierStatus::Exhausted);
        assert!(outcome.verification.is_some());
        assert!(outcome.risk.is_some());
    }

    #[tokio::test]
    async fn test_extraction_failure_is_vacuous_pass() {
        let text = "The bank kept its view after the unparseable results came out.";
        let outcome = runner(Canned::new(vec![Ok(text)]), PipelineConfig::default())
            .run(Tier::Brief, &context(), &sources())
            .await
            .unwrap();

        assert_eq!(outcome.artifact.status, TierStatus::Passed);
        assert_eq!(outcome.stats.extraction_failures, 1);
        assert_eq!(outcome.stats.vacuous_passes, 1);
        assert!(outcome.vacuous());
    }
}
