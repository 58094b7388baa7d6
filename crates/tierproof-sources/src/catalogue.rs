//! Known-unit catalogue (`<root>/units.json`)

use crate::error::{read_json, SourceError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tierproof_domain::{RunId, Unit};

/// Catalogue file name under the data root
pub const CATALOGUE_FILE: &str = "units.json";

/// One known instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitEntry {
    /// Instrument identifier
    pub id: String,
    /// Display name
    pub name: String,
}

impl UnitEntry {
    /// Bind the entry to a run
    pub fn into_unit(self, run_id: RunId) -> Unit {
        Unit::new(self.id, self.name, run_id)
    }
}

/// Load every known unit, in file order
pub async fn load_catalogue(root: &Path) -> Result<Vec<UnitEntry>, SourceError> {
    read_json(root.join(CATALOGUE_FILE)).await
}

/// Resolve requested identifiers against the catalogue
///
/// Identifiers missing from the catalogue are kept with the identifier as
/// display name.
pub fn resolve_units(catalogue: &[UnitEntry], ids: &[String]) -> Vec<UnitEntry> {
    ids.iter()
        .map(|id| {
            catalogue
                .iter()
                .find(|entry| entry.id.eq_ignore_ascii_case(id))
                .cloned()
                .unwrap_or_else(|| UnitEntry {
                    id: id.clone(),
                    name: id.clone(),
                })
        })
        .collect()
}
