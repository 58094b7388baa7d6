//! Tierproof Storage Layer
//!
//! Implements the `PersistenceSink` trait using SQLite, plus an in-memory
//! sink for tests.
//!
//! # Architecture
//!
//! - One transaction per unit: the unit row, its source summaries, tier
//!   artifacts, corrective instructions, per-source claim verifications and
//!   risk scores land together or not at all
//! - One transaction per batch run record and its per-unit outcomes
//! - The full unit record is also kept as JSON for audit read-back
//!
//! # Examples
//!
//! ```no_run
//! use tierproof_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! assert_eq!(store.run_count().unwrap(), 0);
//! ```

#![warn(missing_docs)]

mod memory;

pub use memory::MemorySink;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tierproof_domain::{
    BatchRunRecord, CorrectionKind, CorrectiveInstruction, PersistenceError, PersistenceSink, RunId, Tier,
    TierOutcome, UnitOutcome, UnitRecord, UnitStatus,
};
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record already stored
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Blocking task failed
    #[error("Storage task failed: {0}")]
    Task(String),
}

impl From<StoreError> for PersistenceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => PersistenceError::Duplicate(what),
            StoreError::Serialization(e) => PersistenceError::Serialization(e.to_string()),
            other => PersistenceError::Storage(other.to_string()),
        }
    }
}

/// SQLite-based implementation of PersistenceSink
///
/// The connection sits behind a mutex and every write runs on the blocking
/// thread pool, so one store can be shared by all units of a batch.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write a unit record inside one transaction
    pub fn insert_unit(&self, record: &UnitRecord) -> Result<(), StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let run_id = record.unit.run_id.to_string();
        let unit_id = record.unit.id.as_str();

        tx.execute(
            "INSERT INTO units (run_id, unit_id, name, status, total_attempts, completed_at, record_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &run_id,
                unit_id,
                &record.unit.name,
                record.status.as_str(),
                record.total_attempts(),
                record.completed_at.to_rfc3339(),
                serde_json::to_string(record)?,
            ],
        )
        .map_err(|e| duplicate_or(e, format!("unit {} in run {}", unit_id, run_id)))?;

        for source in &record.sources {
            tx.execute(
                "INSERT INTO unit_sources (run_id, unit_id, provider, status, document_count, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    &run_id,
                    unit_id,
                    &source.provider,
                    source.status.as_str(),
                    source.document_count as i64,
                    &source.error,
                ],
            )?;
        }

        for outcome in &record.tiers {
            insert_tier(&tx, &run_id, unit_id, outcome)?;
        }

        tx.commit()?;
        debug!(unit_id, status = record.status.as_str(), "Unit record stored");
        Ok(())
    }

    /// Write a batch run record and its per-unit outcomes inside one transaction
    pub fn insert_run(&self, record: &BatchRunRecord) -> Result<(), StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let run_id = record.run_id.to_string();

        tx.execute(
            "INSERT INTO batch_runs (run_id, started_at, finished_at, total_units, passed, partially_failed,
                                     errored, skipped, total_attempts, cancelled)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &run_id,
                record.started_at.to_rfc3339(),
                record.finished_at.map(|t| t.to_rfc3339()),
                record.total_units as i64,
                record.passed as i64,
                record.partially_failed as i64,
                record.errored as i64,
                record.skipped as i64,
                record.total_attempts as i64,
                record.cancelled,
            ],
        )
        .map_err(|e| duplicate_or(e, format!("run {}", run_id)))?;

        for outcome in &record.outcomes {
            tx.execute(
                "INSERT INTO batch_run_units (run_id, unit_id, status, attempts, error, outcome_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    &run_id,
                    &outcome.unit_id,
                    outcome.status.as_str(),
                    outcome.attempts,
                    &outcome.error,
                    serde_json::to_string(outcome)?,
                ],
            )
            .map_err(|e| duplicate_or(e, format!("outcome {} in run {}", outcome.unit_id, run_id)))?;
        }

        tx.commit()?;
        debug!(run_id = %record.run_id, outcomes = record.outcomes.len(), "Batch run record stored");
        Ok(())
    }

    /// Read back a stored unit record
    pub fn get_unit(&self, run_id: &RunId, unit_id: &str) -> Result<Option<UnitRecord>, StoreError> {
        let conn = self.lock();
        let json: Option<String> = conn
            .query_row(
                "SELECT record_json FROM units WHERE run_id = ?1 AND unit_id = ?2",
                params![run_id.to_string(), unit_id],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|j| serde_json::from_str(&j).map_err(StoreError::from))
            .transpose()
    }

    /// Terminal status of every unit stored for a run
    pub fn unit_statuses(&self, run_id: &RunId) -> Result<Vec<(String, UnitStatus)>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT unit_id, status FROM units WHERE run_id = ?1 ORDER BY unit_id")?;
        let rows = stmt.query_map(params![run_id.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut statuses = Vec::new();
        for row in rows {
            let (unit_id, status) = row?;
            let status = UnitStatus::parse(&status)
                .ok_or_else(|| StoreError::InvalidData(format!("Unknown unit status: {}", status)))?;
            statuses.push((unit_id, status));
        }
        Ok(statuses)
    }

    /// Corrective instructions stored for one tier, oldest first
    pub fn corrections(&self, run_id: &RunId, unit_id: &str, tier: Tier) -> Result<Vec<CorrectiveInstruction>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT attempt, kind, text FROM corrective_instructions
             WHERE run_id = ?1 AND unit_id = ?2 AND tier = ?3 ORDER BY attempt",
        )?;
        let rows = stmt.query_map(params![run_id.to_string(), unit_id, tier.as_str()], |row| {
            Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;

        let mut corrections = Vec::new();
        for row in rows {
            let (attempt, kind, text) = row?;
            let kind = CorrectionKind::parse(&kind)
                .ok_or_else(|| StoreError::InvalidData(format!("Unknown correction kind: {}", kind)))?;
            corrections.push(CorrectiveInstruction::new(attempt, kind, text));
        }
        Ok(corrections)
    }

    /// Number of (claim, source) verification rows stored for one tier
    pub fn verification_rows(&self, run_id: &RunId, unit_id: &str, tier: Tier) -> Result<usize, StoreError> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM claim_verifications WHERE run_id = ?1 AND unit_id = ?2 AND tier = ?3",
            params![run_id.to_string(), unit_id, tier.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Read back a batch run record
    pub fn get_run(&self, run_id: &RunId) -> Result<Option<BatchRunRecord>, StoreError> {
        let conn = self.lock();
        let key = run_id.to_string();

        let header = conn
            .query_row(
                "SELECT started_at, finished_at, total_units, passed, partially_failed, errored, skipped,
                        total_attempts, cancelled
                 FROM batch_runs WHERE run_id = ?1",
                params![&key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, i64>(7)?,
                        row.get::<_, bool>(8)?,
                    ))
                },
            )
            .optional()?;
        let Some((started_at, finished_at, total, passed, partial, errored, skipped, attempts, cancelled)) = header
        else {
            return Ok(None);
        };

        let mut stmt =
            conn.prepare("SELECT outcome_json FROM batch_run_units WHERE run_id = ?1 ORDER BY rowid")?;
        let rows = stmt.query_map(params![&key], |row| row.get::<_, String>(0))?;
        let mut outcomes: Vec<UnitOutcome> = Vec::new();
        for row in rows {
            outcomes.push(serde_json::from_str(&row?)?);
        }

        Ok(Some(BatchRunRecord {
            run_id: *run_id,
            started_at: parse_time(&started_at)?,
            finished_at: finished_at.as_deref().map(parse_time).transpose()?,
            total_units: total as usize,
            passed: passed as usize,
            partially_failed: partial as usize,
            errored: errored as usize,
            skipped: skipped as usize,
            total_attempts: attempts as u64,
            cancelled,
            outcomes,
        }))
    }

    /// Number of stored batch runs
    pub fn run_count(&self) -> Result<usize, StoreError> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM batch_runs", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn insert_tier(tx: &Transaction<'_>, run_id: &str, unit_id: &str, outcome: &TierOutcome) -> Result<(), StoreError> {
    let artifact = &outcome.artifact;
    let tier = artifact.tier.as_str();

    tx.execute(
        "INSERT INTO tier_artifacts (run_id, unit_id, tier, status, text, word_count, attempt_count,
                                     needs_review, last_error, pass_rate, vacuous)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            run_id,
            unit_id,
            tier,
            artifact.status.as_str(),
            &artifact.text,
            artifact.word_count as i64,
            artifact.attempt_count,
            artifact.needs_review,
            &artifact.last_error,
            outcome.verification.as_ref().map(|v| v.pass_rate),
            outcome.vacuous(),
        ],
    )?;

    for correction in &artifact.corrections {
        tx.execute(
            "INSERT INTO corrective_instructions (run_id, unit_id, tier, attempt, kind, text)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![run_id, unit_id, tier, correction.attempt, correction.kind.as_str(), &correction.text],
        )?;
    }

    if let Some(verification) = &outcome.verification {
        let mut stmt = tx.prepare(
            "INSERT INTO claim_verifications (run_id, unit_id, tier, claim_id, claim_text, kind, claim_status,
                                              provider, source_status, evidence, discrepancy, expected)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )?;
        for claim in &verification.claims {
            let claim_id = claim.claim.id.to_string();
            if claim.sources.is_empty() {
                stmt.execute(params![
                    run_id,
                    unit_id,
                    tier,
                    &claim_id,
                    &claim.claim.text,
                    claim.claim.kind.as_str(),
                    claim.status.as_str(),
                    Option::<String>::None,
                    Option::<String>::None,
                    Option::<String>::None,
                    Option::<String>::None,
                    Option::<String>::None,
                ])?;
            }
            for source in &claim.sources {
                stmt.execute(params![
                    run_id,
                    unit_id,
                    tier,
                    &claim_id,
                    &claim.claim.text,
                    claim.claim.kind.as_str(),
                    claim.status.as_str(),
                    &source.provider,
                    source.status.as_str(),
                    &source.evidence,
                    &source.discrepancy,
                    &source.expected,
                ])?;
            }
        }
    }

    if let Some(risk) = &outcome.risk {
        tx.execute(
            "INSERT INTO risk_scores (run_id, unit_id, tier, cross_source, temporal, uncertainty, score, bucket)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run_id,
                unit_id,
                tier,
                risk.cross_source,
                risk.temporal,
                risk.uncertainty,
                risk.score,
                risk.bucket.as_str(),
            ],
        )?;
    }

    Ok(())
}

fn duplicate_or(err: rusqlite::Error, what: String) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            StoreError::Duplicate(what)
        }
        _ => StoreError::Database(err),
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidData(format!("Invalid timestamp '{}': {}", raw, e)))
}

#[async_trait]
impl PersistenceSink for SqliteStore {
    async fn store_unit(&self, record: &UnitRecord) -> Result<(), PersistenceError> {
        let store = self.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || store.insert_unit(&record))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))??;
        Ok(())
    }

    async fn store_run(&self, record: &BatchRunRecord) -> Result<(), PersistenceError> {
        let store = self.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || store.insert_run(&record))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))??;
        Ok(())
    }
}
