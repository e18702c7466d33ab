use crate::types::{DatabaseError, ScalarType};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name of the manifest inside every table directory.
pub const MANIFEST_FILE: &str = "table.json";

/// Human-readable table description, rewritten in full on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableManifest {
    pub name: String,
    pub rows: u64,
    pub cols: usize,
    pub schema: Vec<ManifestField>,
}

/// One schema entry. Paths are relative to the table directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestField {
    pub field: String,
    #[serde(rename = "type")]
    pub scalar_type: ScalarType,
    pub col_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointers_path: Option<String>,
}

impl TableManifest {
    pub fn read(dir: &Path) -> Result<Self, DatabaseError> {
        let data = fs::read_to_string(dir.join(MANIFEST_FILE))?;
        let manifest: Self = serde_json::from_str(&data)?;
        if manifest.cols != manifest.schema.len() {
            return Err(DatabaseError::CorruptColumn {
                path: dir.join(MANIFEST_FILE),
                reason: format!(
                    "manifest declares {} columns but lists {}",
                    manifest.cols,
                    manifest.schema.len()
                ),
            });
        }
        Ok(manifest)
    }

    pub fn write(&self, dir: &Path) -> Result<(), DatabaseError> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(MANIFEST_FILE), data)?;
        Ok(())
    }
}
