//! Configuration for batch runs

use serde::{Deserialize, Serialize};

/// Configuration for the batch orchestrator
///
/// # Examples
///
/// ```
/// use tierproof_orchestrator::OrchestratorConfig;
///
/// let config = OrchestratorConfig::default();
/// assert_eq!(config.concurrency, 5);
///
/// let config = OrchestratorConfig::aggressive();
/// assert_eq!(config.concurrency, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Units processed at the same time
    /// Default: 5
    pub concurrency: usize,

    /// Highest errored/attempted ratio before the run counts as failed
    /// Default: 0.10
    pub max_error_rate: f64,

    /// Vacuous-pass share of verified tiers that raises the zero-claim alarm
    /// Default: 0.5
    pub vacuous_alarm_ratio: f64,
}

impl OrchestratorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.max_error_rate) {
            return Err("max_error_rate must be in [0.0, 1.0]".to_string());
        }
        if !(0.0..=1.0).contains(&self.vacuous_alarm_ratio) {
            return Err("vacuous_alarm_ratio must be in [0.0, 1.0]".to_string());
        }
        Ok(())
    }

    /// Aggressive preset: more units in flight, no tolerance for errors
    pub fn aggressive() -> Self {
        Self {
            concurrency: 10,
            max_error_rate: 0.0,
            vacuous_alarm_ratio: 0.25,
        }
    }

    /// Lenient preset: fewer units in flight, more tolerance for errors
    pub fn lenient() -> Self {
        Self {
            concurrency: 2,
            max_error_rate: 0.25,
            vacuous_alarm_ratio: 0.75,
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

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            max_error_rate: 0.10,
            vacuous_alarm_ratio: 0.5,
        }
    }
}
