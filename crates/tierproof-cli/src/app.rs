//! Wiring of the batch run from configuration.
//!
//! Collaborators are built once per run and handed down to every unit.

use crate::config::{Config, ExtractorKind, GeneratorKind};
use crate::error::Result;
use std::sync::Arc;
use tierproof_domain::{ClaimExtractor, GenerationProvider, PassageRetriever, SourceAdapter};
use tierproof_extractor::{LlmClaimExtractor, PatternExtractor};
use tierproof_llm::{ExtractiveGenerator, OllamaProvider, PromptedGenerator};
use tierproof_pipeline::{Collaborators, UnitPipeline};
use tierproof_sources::{FixtureAdapter, LexicalRetriever, NoRetrieval, DEFAULT_PROVIDERS};
use tierproof_store::SqliteStore;
use tierproof_verifier::{RiskScorer, Verifier};
use tracing::info;

/// Open the database, creating its directory when needed
pub fn open_store(config: &Config) -> Result<SqliteStore> {
    if let Some(parent) = config.data.database.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(SqliteStore::new(&config.data.database)?)
}

/// Build the unit pipeline described by `config`
pub fn build_pipeline(config: &Config, store: SqliteStore) -> Result<UnitPipeline> {
    let root = &config.data.fixtures_dir;
    let adapters: Vec<Arc<dyn SourceAdapter>> = DEFAULT_PROVIDERS
        .iter()
        .map(|provider| Arc::new(FixtureAdapter::new(root, *provider)) as Arc<dyn SourceAdapter>)
        .collect();

    let generation = &config.generation;
    let generator: Arc<dyn GenerationProvider> = match generation.provider {
        GeneratorKind::Extractive => Arc::new(ExtractiveGenerator::new()),
        GeneratorKind::Ollama => Arc::new(PromptedGenerator::new(OllamaProvider::with_timeout(
            &generation.endpoint,
            &generation.model,
            config.pipeline.generation_timeout(),
        ))),
    };

    let extractor: Arc<dyn ClaimExtractor> = match generation.claims {
        ExtractorKind::Pattern => Arc::new(PatternExtractor::new(config.extractor.clone())),
        ExtractorKind::Llm => Arc::new(LlmClaimExtractor::new(
            OllamaProvider::new(&generation.endpoint, &generation.model),
            config.extractor.clone(),
        )),
    };

    let retriever: Arc<dyn PassageRetriever> = if config.data.retrieval {
        Arc::new(LexicalRetriever::new(root))
    } else {
        Arc::new(NoRetrieval)
    };

    info!(
        generator = generator.name(),
        fixtures = %root.display(),
        database = %config.data.database.display(),
        "Pipeline configured"
    );

    let collaborators = Collaborators {
        adapters,
        generator,
        extractor,
        retriever,
        sink: Arc::new(store),
    };
    Ok(UnitPipeline::new(
        config.pipeline.clone(),
        Verifier::new(config.verifier.clone()),
        RiskScorer::new(config.risk.clone()),
        collaborators,
    )?)
}
