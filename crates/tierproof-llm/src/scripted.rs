//! Deterministic stub for the generation capability
//!
//! Each tier gets its own script of canned outcomes consumed in order; the
//! last entry repeats once the script runs out. Every request is logged so
//! tests can assert on the corrective instructions a retry received.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tierproof_domain::{GenerationError, GenerationProvider, GenerationRequest, Tier};

/// Per-tier canned generation outputs with a request log
///
/// # Examples
///
/// ```
/// use tierproof_domain::Tier;
/// use tierproof_llm::ScriptedGenerator;
///
/// let generator = ScriptedGenerator::new()
///     .with_responses(Tier::Brief, ["Tick Corp reported revenue of $5.2 billion for fiscal 2024."])
///     .with_responses(Tier::Medium, ["first attempt", "second attempt"]);
/// assert_eq!(generator.call_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    scripts: Mutex<HashMap<Tier, VecDeque<Result<String, GenerationError>>>>,
    log: Mutex<Vec<GenerationRequest>>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    /// Create an empty generator; unscripted tiers fail
    pub fn new() -> Self {
        Self::default()
    }

    fn script_mut(&mut self, tier: Tier) -> &mut VecDeque<Result<String, GenerationError>> {
        self.scripts
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(tier)
            .or_default()
    }

    /// Append canned texts to a tier's script
    pub fn with_responses<I, S>(mut self, tier: Tier, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script = self.script_mut(tier);
        script.extend(responses.into_iter().map(|r| Ok(r.into())));
        self
    }

    /// Append a failure to a tier's script
    pub fn with_error(mut self, tier: Tier, error: GenerationError) -> Self {
        self.script_mut(tier).push_back(Err(error));
        self
    }

    /// Sleep before every response
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Requests received for one tier
    pub fn requests_for(&self, tier: Tier) -> Vec<GenerationRequest> {
        self.requests().into_iter().filter(|r| r.tier == tier).collect()
    }

    /// Number of generate calls
    pub fn call_count(&self) -> usize {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn next_for(&self, tier: Tier) -> Result<String, GenerationError> {
        let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(script) = scripts.get_mut(&tier) else {
            return Err(GenerationError::Backend(format!("no script for {} tier", tier)));
        };
        if script.len() > 1 {
            script.pop_front().unwrap_or_else(|| Err(GenerationError::Backend("empty script".to_string())))
        } else {
            script
                .front()
                .cloned()
                .unwrap_or_else(|| Err(GenerationError::Backend(format!("empty script for {} tier", tier))))
        }
    }
}

#[async_trait]
impl GenerationProvider for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_for(request.tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierproof_domain::{AssembledContext, WordRange};

    fn request(tier: Tier, attempt: u32) -> GenerationRequest {
        GenerationRequest {
            tier,
            context: AssembledContext {
                tier,
                unit_id: "TICK".to_string(),
                unit_name: "Tick Corp".to_string(),
                excerpts: Vec::new(),
                passages: Vec::new(),
                truncated: false,
            },
            corrections: Vec::new(),
            word_range: WordRange::new(1, 100),
            attempt,
        }
    }

    #[tokio::test]
    async fn test_script_consumed_in_order_then_repeats() {
        let generator = ScriptedGenerator::new().with_responses(Tier::Medium, ["one", "two"]);

        assert_eq!(generator.generate(&request(Tier::Medium, 1)).await.unwrap(), "one");
        assert_eq!(generator.generate(&request(Tier::Medium, 2)).await.unwrap(), "two");
        assert_eq!(generator.generate(&request(Tier::Medium, 3)).await.unwrap(), "two");
        assert_eq!(generator.requests_for(Tier::Medium).len(), 3);
    }

    #[tokio::test]
    async fn test_error_injection_and_unscripted_tier() {
        let generator = ScriptedGenerator::new()
            .with_error(Tier::Brief, GenerationError::Backend("down".to_string()))
            .with_responses(Tier::Brief, ["recovered"]);

        assert!(generator.generate(&request(Tier::Brief, 1)).await.is_err());
        assert_eq!(generator.generate(&request(Tier::Brief, 2)).await.unwrap(), "recovered");
        assert!(generator.generate(&request(Tier::Expanded, 1)).await.is_err());
        assert_eq!(generator.call_count(), 3);
    }
}
