//! Configuration for claim extraction

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the claim extractors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Maximum time for a single LLM extraction call (seconds)
    pub extraction_timeout_secs: u64,

    /// Minimum words a clause needs to become an event claim
    pub min_event_words: usize,

    /// Rating labels recognised as attributions (longest first matters)
    pub rating_labels: Vec<String>,

    /// Verbs that mark a clause as asserting an event
    pub event_verbs: Vec<String>,
}

impl ExtractorConfig {
    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
        }
        if self.min_event_words == 0 {
            return Err("min_event_words must be greater than 0".to_string());
        }
        if self.rating_labels.iter().any(|l| l.trim().is_empty()) {
            return Err("rating_labels cannot contain empty labels".to_string());
        }
        Ok(())
    }

    /// Aggressive preset: shorter timeout, more clauses become event claims
    pub fn aggressive() -> Self {
        Self {
            max_text_length: 20_000,
            extraction_timeout_secs: 30,
            min_event_words: 3,
            ..Self::default()
        }
    }

    /// Lenient preset: longer timeout, only longer clauses become event claims
    pub fn lenient() -> Self {
        Self {
            max_text_length: 100_000,
            extraction_timeout_secs: 300,
            min_event_words: 6,
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

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_text_length: 50_000,
            extraction_timeout_secs: 60,
            min_event_words: 4,
            rating_labels: [
                "Strong Buy",
                "Strong Sell",
                "Equal Weight",
                "Market Perform",
                "Outperform",
                "Underperform",
                "Overweight",
                "Underweight",
                "Neutral",
                "Hold",
                "Buy",
                "Sell",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            event_verbs: [
                "announced",
                "acquired",
                "agreed",
                "appointed",
                "approved",
                "authorized",
                "closed",
                "completed",
                "declared",
                "downgraded",
                "filed",
                "initiated",
                "issued",
                "launched",
                "named",
                "raised",
                "reiterated",
                "repurchased",
                "reported",
                "resigned",
                "settled",
                "signed",
                "upgraded",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractorConfig::default().validate().is_ok());
        assert!(ExtractorConfig::aggressive().validate().is_ok());
        assert!(ExtractorConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let mut config = ExtractorConfig::default();
        config.max_text_length = 0;
        assert!(config.validate().is_err());

        let mut config = ExtractorConfig::default();
        config.rating_labels.push("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_partial_override() {
        let config = ExtractorConfig::from_toml("min_event_words = 7").unwrap();
        assert_eq!(config.min_event_words, 7);
        assert_eq!(config.max_text_length, ExtractorConfig::default().max_text_length);

        let toml_str = config.to_toml().unwrap();
        assert_eq!(ExtractorConfig::from_toml(&toml_str).unwrap(), config);
    }
}
