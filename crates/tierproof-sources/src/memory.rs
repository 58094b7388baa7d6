//! In-memory adapter with delay and failure injection

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tierproof_domain::{AdapterError, FetchedDocuments, SourceAdapter, SourceDocument};

/// Counts concurrent calls and remembers the peak
#[derive(Debug, Default)]
pub struct InFlightGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

impl InFlightGauge {
    /// Create a shared gauge
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Mark a call as started; the guard marks it finished when dropped
    pub fn enter(self: &Arc<Self>) -> GaugeGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        GaugeGuard { gauge: Arc::clone(self) }
    }

    /// Calls currently in flight
    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous calls observed
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Calls started so far
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

/// Decrements its gauge on drop
#[derive(Debug)]
pub struct GaugeGuard {
    gauge: Arc<InFlightGauge>,
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.gauge.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Adapter serving documents from memory
///
/// Units without documents get `NotFound`. A configured failure is returned
/// for every unit; a delay is applied before every answer.
///
/// # Examples
///
/// ```
/// use tierproof_sources::StaticAdapter;
/// use tierproof_domain::AdapterError;
///
/// let adapter = StaticAdapter::new("news").with_failure(AdapterError::Io("down".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct StaticAdapter {
    provider: String,
    documents: HashMap<String, Vec<SourceDocument>>,
    dropped: HashMap<String, Vec<String>>,
    failure: Option<AdapterError>,
    delay: Option<Duration>,
    gauge: Option<Arc<InFlightGauge>>,
}

impl StaticAdapter {
    /// Create an adapter with no documents
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            documents: HashMap::new(),
            dropped: HashMap::new(),
            failure: None,
            delay: None,
            gauge: None,
        }
    }

    /// Serve these documents for a unit
    pub fn with_documents(mut self, unit_id: impl Into<String>, documents: Vec<SourceDocument>) -> Self {
        self.documents.entry(unit_id.into()).or_default().extend(documents);
        self
    }

    /// Report a dropped entry for a unit, making its fetch partial
    pub fn with_dropped(mut self, unit_id: impl Into<String>, reason: impl Into<String>) -> Self {
        self.dropped.entry(unit_id.into()).or_default().push(reason.into());
        self
    }

    /// Fail every fetch with this error
    pub fn with_failure(mut self, error: AdapterError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Track concurrent fetches on a shared gauge
    pub fn with_gauge(mut self, gauge: Arc<InFlightGauge>) -> Self {
        self.gauge = Some(gauge);
        self
    }
}

#[async_trait]
impl SourceAdapter for StaticAdapter {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn fetch(&self, unit_id: &str) -> Result<FetchedDocuments, AdapterError> {
        let _guard = self.gauge.as_ref().map(|g| g.enter());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let documents = self.documents.get(unit_id).cloned().unwrap_or_default();
        let dropped = self.dropped.get(unit_id).cloned().unwrap_or_default();
        if documents.is_empty() && dropped.is_empty() {
            return Err(AdapterError::NotFound(unit_id.to_string()));
        }
        Ok(FetchedDocuments { documents, dropped })
    }
}
