//! Unit pipeline: ingest, generate and verify three tiers, persist once

use chrono::{NaiveDate, Utc};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tierproof_domain::{
    AdapterError, ClaimExtractor, GenerationProvider, PassageRetriever, PersistenceSink, SourceAdapter,
    SourceBundle, SourceFetch, SourceSummary, Tier, TierOutcome, Unit, UnitRecord,
};
use tierproof_verifier::{RiskScorer, Verifier};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{info, info_span, warn, Instrument};

use crate::config::PipelineConfig;
use crate::context::ContextAssembler;
use crate::error::PipelineError;
use crate::tier::TierRunner;

/// External collaborators, constructed once per batch run
#[derive(Clone)]
pub struct Collaborators {
    /// Source adapters, one per provider
    pub adapters: Vec<Arc<dyn SourceAdapter>>,
    /// Generation capability
    pub generator: Arc<dyn GenerationProvider>,
    /// Claim extractor
    pub extractor: Arc<dyn ClaimExtractor>,
    /// Passage retrieval
    pub retriever: Arc<dyn PassageRetriever>,
    /// Persistence sink
    pub sink: Arc<dyn PersistenceSink>,
}

/// Processes one unit end to end
///
/// Source ingestion joins before any tier starts; the three tier loops run
/// concurrently and join before the single persistence write.
#[derive(Clone)]
pub struct UnitPipeline {
    config: Arc<PipelineConfig>,
    collaborators: Collaborators,
    verifier: Arc<Verifier>,
    scorer: Arc<RiskScorer>,
    assembler: ContextAssembler,
    as_of: NaiveDate,
}

impl UnitPipeline {
    /// Create a pipeline after validating its configuration
    pub fn new(
        config: PipelineConfig,
        verifier: Verifier,
        scorer: RiskScorer,
        collaborators: Collaborators,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;
        Ok(Self {
            assembler: ContextAssembler::new(&config),
            config: Arc::new(config),
            collaborators,
            verifier: Arc::new(verifier),
            scorer: Arc::new(scorer),
            as_of: Utc::now().date_naive(),
        })
    }

    /// Set the run date used for temporal plausibility
    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = as_of;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The sink unit records are written to
    pub fn sink(&self) -> Arc<dyn PersistenceSink> {
        Arc::clone(&self.collaborators.sink)
    }

    /// Process a unit and persist its record
    ///
    /// Only a persistence failure or a broken tier task is an error; every
    /// other failure is recorded inside the returned record.
    pub async fn run(&self, unit: Unit) -> Result<UnitRecord, PipelineError> {
        let span = info_span!("unit", unit_id = %unit.id, run_id = %unit.run_id);
        async move {
            let record = self.process(unit).await?;
            self.collaborators.sink.store_unit(&record).await?;
            info!(
                status = record.status.as_str(),
                attempts = record.total_attempts(),
                "Unit record persisted"
            );
            Ok(record)
        }
        .instrument(span)
        .await
    }

    /// Process a unit without persisting it
    pub async fn process(&self, unit: Unit) -> Result<UnitRecord, PipelineError> {
        let sources = Arc::new(self.ingest(&unit.id).await);
        let summaries = summarize(&sources);
        let failed = sources.failed_providers();
        if !failed.is_empty() {
            warn!(providers = ?failed, "Continuing with fewer sources");
        }

        let tiers = self.run_tiers(&unit, &sources).await?;
        Ok(UnitRecord::new(unit, tiers, summaries))
    }

    /// Fetch from every adapter concurrently and join
    ///
    /// Errors, timeouts and panics of an adapter become a `failed` fetch;
    /// dropped entries make it `partial`.
    pub async fn ingest(&self, unit_id: &str) -> SourceBundle {
        let mut set = JoinSet::new();
        for (idx, adapter) in self.collaborators.adapters.iter().enumerate() {
            let adapter = Arc::clone(adapter);
            let unit_id = unit_id.to_string();
            let limit = self.config.adapter_timeout();
            let limit_ms = self.config.adapter_timeout_ms;

            set.spawn(
                async move {
                    let provider = adapter.provider().to_string();
                    let call = AssertUnwindSafe(timeout(limit, adapter.fetch(&unit_id))).catch_unwind();
                    let fetch = match call.await {
                        Ok(Ok(Ok(fetched))) if fetched.dropped.is_empty() => {
                            SourceFetch::success(provider, fetched.documents)
                        }
                        Ok(Ok(Ok(fetched))) => SourceFetch::partial(provider, fetched.documents, fetched.dropped.join("; ")),
                        Ok(Ok(Err(e))) => SourceFetch::failed(provider, e.to_string()),
                        Ok(Err(_)) => SourceFetch::failed(provider, AdapterError::Timeout(limit_ms).to_string()),
                        Err(_) => SourceFetch::failed(provider, "adapter panicked"),
                    };
                    (idx, fetch)
                }
                .in_current_span(),
            );
        }

        let mut fetches = Vec::with_capacity(self.collaborators.adapters.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(entry) => fetches.push(entry),
                Err(e) => warn!(error = %e, "Adapter task lost"),
            }
        }
        fetches.sort_by_key(|(idx, _)| *idx);

        for (_, fetch) in &fetches {
            match &fetch.error {
                Some(error) => warn!(provider = %fetch.provider, status = fetch.status.as_str(), error = %error, "Source fetch degraded"),
                None => info!(provider = %fetch.provider, documents = fetch.documents.len(), "Source fetched"),
            }
        }
        SourceBundle::new(fetches.into_iter().map(|(_, fetch)| fetch).collect())
    }

    async fn run_tiers(&self, unit: &Unit, sources: &Arc<SourceBundle>) -> Result<Vec<TierOutcome>, PipelineError> {
        let runner = TierRunner::new(
            Arc::clone(&self.collaborators.generator),
            Arc::clone(&self.collaborators.extractor),
            Arc::clone(&self.verifier),
            Arc::clone(&self.scorer),
            Arc::clone(&self.config),
            self.as_of,
        );

        let mut set = JoinSet::new();
        for tier in Tier::ALL {
            let runner = runner.clone();
            let retriever = Arc::clone(&self.collaborators.retriever);
            let assembler = self.assembler.clone();
            let sources = Arc::clone(sources);
            let unit = unit.clone();
            let limit = self.config.retrieval_limit;

            set.spawn(
                async move {
                    let query = format!("{} {}", unit.name, unit.id);
                    let passages = if limit == 0 {
                        Vec::new()
                    } else {
                        retriever.retrieve(&unit.id, tier, &query, limit).await
                    };
                    let context = assembler.assemble(&unit, tier, &sources, passages);
                    runner.run(tier, &context, &sources).await
                }
                .instrument(info_span!("tier", tier = tier.as_str())),
            );
        }

        let mut outcomes = Vec::with_capacity(Tier::ALL.len());
        while let Some(joined) = set.join_next().await {
            let outcome = joined.map_err(|e| PipelineError::TierTask(e.to_string()))??;
            outcomes.push(outcome);
        }
        outcomes.sort_by_key(TierOutcome::tier);
        Ok(outcomes)
    }
}

fn summarize(sources: &SourceBundle) -> Vec<SourceSummary> {
    sources
        .fetches
        .iter()
        .map(|fetch| SourceSummary {
            provider: fetch.provider.clone(),
            status: fetch.status,
            document_count: fetch.documents.len(),
            error: fetch.error.clone(),
        })
        .collect()
}
