//! Unit module - one instrument processed in one run

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one batch run (UUIDv7, sortable by start time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RunId(u128);

impl RunId {
    /// Generate a new run id
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Parse a run id from its UUID string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid run id: {}", e))
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl From<RunId> for String {
    fn from(id: RunId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for RunId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_string(&value)
    }
}

/// One instrument being processed in one run
///
/// Identity is fixed at batch start; nothing downstream mutates a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Instrument identifier (e.g. a ticker)
    pub id: String,
    /// Display name (e.g. "Tick Corp")
    pub name: String,
    /// Run this unit belongs to
    pub run_id: RunId,
}

impl Unit {
    /// Create a unit for the given run
    pub fn new(id: impl Into<String>, name: impl Into<String>, run_id: RunId) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            run_id,
        }
    }
}
