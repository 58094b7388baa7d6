//! Verifier and risk scorer configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tierproof_domain::text::DEFAULT_CORPORATE_SUFFIXES;
use tierproof_domain::RiskBucket;

/// Configuration for multi-source verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Relative tolerance for numeric matches (0.01 = ±1%)
    pub numeric_tolerance: f64,

    /// Minimum closeness score for an event claim to count as entailed (0.0-1.0)
    pub similarity_threshold: f64,

    /// Pass rate a tier needs to pass (0.0-1.0)
    pub pass_threshold: f64,

    /// Suffixes stripped when comparing firm names
    pub corporate_suffixes: Vec<String>,

    /// Field-name tokens expanded before matching a field against a claim subject
    pub field_aliases: BTreeMap<String, Vec<String>>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            numeric_tolerance: 0.01,
            similarity_threshold: 0.72,
            pass_threshold: 0.95,
            corporate_suffixes: DEFAULT_CORPORATE_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            field_aliases: BTreeMap::from([
                ("eps".to_string(), vec!["earnings".to_string(), "share".to_string()]),
                ("pt".to_string(), vec!["price".to_string(), "target".to_string()]),
                ("mkt".to_string(), vec!["market".to_string()]),
                ("cap".to_string(), vec!["capitalization".to_string()]),
            ]),
        }
    }
}

impl VerifierConfig {
    /// Permissive configuration: wider tolerance and looser entailment
    pub fn permissive() -> Self {
        Self {
            numeric_tolerance: 0.02,
            similarity_threshold: 0.6,
            ..Self::default()
        }
    }

    /// Strict configuration: tighter tolerance and entailment
    pub fn strict() -> Self {
        Self {
            numeric_tolerance: 0.005,
            similarity_threshold: 0.85,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..1.0).contains(&self.numeric_tolerance) {
            return Err("numeric_tolerance must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) || self.similarity_threshold == 0.0 {
            return Err("similarity_threshold must be greater than 0.0 and at most 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.pass_threshold) {
            return Err("pass_threshold must be between 0.0 and 1.0".to_string());
        }
        Ok(())
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

/// Configuration for the hallucination risk scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Weight of the cross-source consistency layer
    pub cross_source_weight: f64,

    /// Weight of the temporal consistency layer
    pub temporal_weight: f64,

    /// Weight of the uncertainty layer
    pub uncertainty_weight: f64,

    /// Words and phrases marking hedged language
    pub hedge_markers: Vec<String>,

    /// Words and phrases marking confident assertions
    pub confident_markers: Vec<String>,

    /// Share of hedged sentences above which hedging counts as unusual (0.0-1.0)
    pub hedge_density_threshold: f64,

    /// Unverified share of claims at which the cross-source layer saturates;
    /// matches the slack a passing tier is allowed (1 - pass threshold)
    pub unverified_allowance: f64,

    /// Lowest bucket that routes a tier to human review
    pub review_from: RiskBucket,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            cross_source_weight: 0.5,
            temporal_weight: 0.2,
            uncertainty_weight: 0.3,
            hedge_markers: to_strings(&[
                "approximately",
                "about",
                "around",
                "roughly",
                "may",
                "might",
                "could",
                "possibly",
                "perhaps",
                "likely",
                "unclear",
                "uncertain",
                "reportedly",
                "estimated",
                "appears",
                "seems",
                "suggests",
            ]),
            confident_markers: to_strings(&[
                "definitely",
                "certainly",
                "clearly",
                "undoubtedly",
                "guaranteed",
                "always",
                "never",
                "will",
                "confirmed",
                "proven",
            ]),
            hedge_density_threshold: 0.4,
            unverified_allowance: 0.05,
            review_from: RiskBucket::High,
        }
    }
}

impl RiskConfig {
    /// Layer weights in combination order
    pub fn weights(&self) -> [f64; 3] {
        [self.cross_source_weight, self.temporal_weight, self.uncertainty_weight]
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let weights = self.weights();
        if weights.iter().any(|w| *w < 0.0) {
            return Err("layer weights cannot be negative".to_string());
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err("at least one layer weight must be positive".to_string());
        }
        if !(0.0..1.0).contains(&self.hedge_density_threshold) {
            return Err("hedge_density_threshold must be in [0.0, 1.0)".to_string());
        }
        if !(self.unverified_allowance > 0.0 && self.unverified_allowance <= 1.0) {
            return Err("unverified_allowance must be in (0.0, 1.0]".to_string());
        }
        Ok(())
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

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VerifierConfig::default();
        assert_eq!(config.numeric_tolerance, 0.01);
        assert_eq!(config.pass_threshold, 0.95);
        assert!(config.validate().is_ok());
        assert!(VerifierConfig::permissive().validate().is_ok());
        assert!(VerifierConfig::strict().validate().is_ok());

        let risk = RiskConfig::default();
        assert_eq!(risk.weights(), [0.5, 0.2, 0.3]);
        assert!(risk.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let config = VerifierConfig {
            pass_threshold: 1.5,
            ..VerifierConfig::default()
        };
        assert!(config.validate().is_err());

        let risk = RiskConfig {
            cross_source_weight: 0.0,
            temporal_weight: 0.0,
            uncertainty_weight: 0.0,
            ..RiskConfig::default()
        };
        assert!(risk.validate().is_err());

        let risk = RiskConfig {
            unverified_allowance: 0.0,
            ..RiskConfig::default()
        };
        assert!(risk.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let risk = RiskConfig::from_toml("review_from = \"critical\"\ntemporal_weight = 0.1").unwrap();
        assert_eq!(risk.review_from, RiskBucket::Critical);
        assert_eq!(risk.temporal_weight, 0.1);

        let config = VerifierConfig::strict();
        let back = VerifierConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
