//! Configuration management for the CLI.
//!
//! One TOML file holds the settings of every component. Sections missing
//! from the file keep their defaults; a missing file means all defaults.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tierproof_extractor::ExtractorConfig;
use tierproof_orchestrator::OrchestratorConfig;
use tierproof_pipeline::PipelineConfig;
use tierproof_verifier::{RiskConfig, VerifierConfig};

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global settings
    pub settings: Settings,

    /// Generation back end
    pub generation: GenerationSettings,

    /// Data locations
    pub data: DataSettings,

    /// Unit pipeline
    pub pipeline: PipelineConfig,

    /// Batch orchestrator
    pub orchestrator: OrchestratorConfig,

    /// Claim extraction
    pub extractor: ExtractorConfig,

    /// Multi-source verification
    pub verifier: VerifierConfig,

    /// Hallucination risk scoring
    pub risk: RiskConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Enable colored output
    pub color: bool,

    /// Default output format
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

/// Which generation capability to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// Offline generator composing tiers from source sentences
    Extractive,
    /// Local Ollama model
    Ollama,
}

/// Which claim extractor to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Rule-based extraction
    Pattern,
    /// Model-backed extraction through the generation endpoint
    Llm,
}

/// `[generation]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Generation capability
    pub provider: GeneratorKind,

    /// Claim extractor
    pub claims: ExtractorKind,

    /// Model API endpoint
    pub endpoint: String,

    /// Model name
    pub model: String,
}

/// `[data]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Root of the provider fixture directories and `units.json`
    pub fixtures_dir: PathBuf,

    /// SQLite database file
    pub database: PathBuf,

    /// Rank stored passages into each tier's context
    pub retrieval: bool,
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".tierproof").join("config.toml"))
    }

    /// Load configuration from `path` (or the default path).
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            Self::from_toml(&contents)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a configuration.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate every component section.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("pipeline", self.pipeline.validate()),
            ("orchestrator", self.orchestrator.validate()),
            ("extractor", self.extractor.validate()),
            ("verifier", self.verifier.validate()),
            ("risk", self.risk.validate()),
        ];
        for (section, check) in checks {
            check.map_err(|e| CliError::Config(format!("[{}] {}", section, e)))?;
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: GeneratorKind::Extractive,
            claims: ExtractorKind::Pattern,
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
        }
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        let database = dirs::home_dir()
            .map(|home| home.join(".tierproof").join("tierproof.db"))
            .unwrap_or_else(|| PathBuf::from("tierproof.db"));
        Self {
            fixtures_dir: PathBuf::from("data"),
            database,
            retrieval: true,
        }
    }
}
