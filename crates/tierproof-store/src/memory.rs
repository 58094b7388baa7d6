//! In-memory persistence sink for tests

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tierproof_domain::{BatchRunRecord, PersistenceError, PersistenceSink, UnitRecord};

/// Keeps every stored record in memory
///
/// Unit writes can be made to fail per unit id, run writes as a whole.
#[derive(Debug, Default)]
pub struct MemorySink {
    units: Mutex<Vec<UnitRecord>>,
    runs: Mutex<Vec<BatchRunRecord>>,
    failing_units: HashSet<String>,
    fail_runs: bool,
    delay: Option<Duration>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write of this unit
    pub fn with_unit_failure(mut self, unit_id: impl Into<String>) -> Self {
        self.failing_units.insert(unit_id.into());
        self
    }

    /// Fail every batch run write
    pub fn with_run_failure(mut self) -> Self {
        self.fail_runs = true;
        self
    }

    /// Sleep before every write
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Stored unit records, in write order
    pub fn units(&self) -> Vec<UnitRecord> {
        self.units.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Stored record for one unit
    pub fn unit(&self, unit_id: &str) -> Option<UnitRecord> {
        self.units().into_iter().find(|u| u.unit.id == unit_id)
    }

    /// Stored batch run records
    pub fn runs(&self) -> Vec<BatchRunRecord> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl PersistenceSink for MemorySink {
    async fn store_unit(&self, record: &UnitRecord) -> Result<(), PersistenceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_units.contains(&record.unit.id) {
            return Err(PersistenceError::Storage(format!("write rejected for {}", record.unit.id)));
        }

        let mut units = self.units.lock().unwrap_or_else(PoisonError::into_inner);
        if units
            .iter()
            .any(|u| u.unit.id == record.unit.id && u.unit.run_id == record.unit.run_id)
        {
            return Err(PersistenceError::Duplicate(record.unit.id.clone()));
        }
        units.push(record.clone());
        Ok(())
    }

    async fn store_run(&self, record: &BatchRunRecord) -> Result<(), PersistenceError> {
        if self.fail_runs {
            return Err(PersistenceError::Storage("run write rejected".to_string()));
        }

        let mut runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        if runs.iter().any(|r| r.run_id == record.run_id) {
            return Err(PersistenceError::Duplicate(record.run_id.to_string()));
        }
        runs.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierproof_domain::{RunId, Unit};

    fn record(id: &str, run_id: RunId) -> UnitRecord {
        UnitRecord::new(Unit::new(id, id, run_id), Vec::new(), Vec::new())
    }

    #[tokio::test]
    async fn test_stores_and_rejects_duplicates() {
        let sink = MemorySink::new();
        let run_id = RunId::new();

        sink.store_unit(&record("TICK", run_id)).await.unwrap();
        assert!(matches!(
            sink.store_unit(&record("TICK", run_id)).await,
            Err(PersistenceError::Duplicate(_))
        ));
        assert_eq!(sink.units().len(), 1);
        assert!(sink.unit("TICK").is_some());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let sink = MemorySink::new().with_unit_failure("BAD").with_run_failure();
        let run_id = RunId::new();

        assert!(sink.store_unit(&record("BAD", run_id)).await.is_err());
        assert!(sink.store_unit(&record("GOOD", run_id)).await.is_ok());
        assert!(sink.store_run(&BatchRunRecord::new(run_id, 2)).await.is_err());
        assert!(sink.runs().is_empty());
    }
}
