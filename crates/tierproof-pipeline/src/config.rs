//! Configuration for the unit pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tierproof_domain::{Tier, WordRange};

/// Word-range profile for the expanded tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpandedProfile {
    /// 200-400 words
    Short,
    /// 200-750 words
    #[default]
    Standard,
    /// 400-750 words
    Long,
}

impl ExpandedProfile {
    /// Word range of the expanded tier under this profile
    pub fn word_range(&self) -> WordRange {
        match self {
            ExpandedProfile::Short => WordRange::new(200, 400),
            ExpandedProfile::Standard => WordRange::new(200, 750),
            ExpandedProfile::Long => WordRange::new(400, 750),
        }
    }
}

/// Configuration for one unit pipeline and its tier loops
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Generation attempts per tier before it is exhausted
    pub max_attempts: u32,

    /// Timeout for one source adapter call (milliseconds)
    pub adapter_timeout_ms: u64,

    /// Timeout for one generation call (milliseconds)
    pub generation_timeout_ms: u64,

    /// Word range of the brief tier
    pub brief_words: WordRange,

    /// Word range of the medium tier
    pub medium_words: WordRange,

    /// Word-range profile of the expanded tier
    pub expanded_profile: ExpandedProfile,

    /// Context budget for the brief tier (characters)
    pub brief_context_chars: usize,

    /// Context budget for the medium tier (characters)
    pub medium_context_chars: usize,

    /// Context budget for the expanded tier (characters)
    pub expanded_context_chars: usize,

    /// Share of the context budget reserved for retrieved passages
    pub passage_share: f64,

    /// Passages requested from the retriever per tier
    pub retrieval_limit: usize,
}

impl PipelineConfig {
    /// Word range a tier's text must fall within
    pub fn word_range(&self, tier: Tier) -> WordRange {
        match tier {
            Tier::Brief => self.brief_words,
            Tier::Medium => self.medium_words,
            Tier::Expanded => self.expanded_profile.word_range(),
        }
    }

    /// Context character budget for a tier
    pub fn context_budget(&self, tier: Tier) -> usize {
        match tier {
            Tier::Brief => self.brief_context_chars,
            Tier::Medium => self.medium_context_chars,
            Tier::Expanded => self.expanded_context_chars,
        }
    }

    /// Get the adapter timeout as a Duration
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_millis(self.adapter_timeout_ms)
    }

    /// Get the generation timeout as a Duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.adapter_timeout_ms == 0 {
            return Err("adapter_timeout_ms must be greater than 0".to_string());
        }
        if self.generation_timeout_ms == 0 {
            return Err("generation_timeout_ms must be greater than 0".to_string());
        }
        for (name, range) in [("brief_words", self.brief_words), ("medium_words", self.medium_words)] {
            if range.min == 0 || range.min > range.max {
                return Err(format!("{} must be a non-empty range starting above 0", name));
            }
        }
        for tier in Tier::ALL {
            if self.context_budget(tier) == 0 {
                return Err(format!("{} context budget must be greater than 0", tier));
            }
        }
        if !(0.0..1.0).contains(&self.passage_share) {
            return Err("passage_share must be in [0.0, 1.0)".to_string());
        }
        Ok(())
    }

    /// Aggressive preset: fewer attempts and shorter timeouts
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 3,
            adapter_timeout_ms: 5_000,
            generation_timeout_ms: 30_000,
            expanded_profile: ExpandedProfile::Short,
            ..Self::default()
        }
    }

    /// Lenient preset: longer timeouts for slow back ends
    pub fn lenient() -> Self {
        Self {
            adapter_timeout_ms: 30_000,
            generation_timeout_ms: 180_000,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            adapter_timeout_ms: 10_000,
            generation_timeout_ms: 60_000,
            brief_words: Tier::Brief.default_word_range(),
            medium_words: Tier::Medium.default_word_range(),
            expanded_profile: ExpandedProfile::Standard,
            brief_context_chars: 2_000,
            medium_context_chars: 6_000,
            expanded_context_chars: 16_000,
            passage_share: 0.2,
            retrieval_limit: 5,
        }
    }
}
