//! Section version model.
//!
//! Versions are immutable: a row is never updated after insert.

use pagetree_core::error::CoreError;
use pagetree_core::exchange::SectionDict;
use pagetree_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `section_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SectionVersionRow {
    pub id: DbId,
    pub section_id: DbId,
    pub user_id: DbId,
    pub activity: String,
    pub data: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SectionVersionRow {
    /// Decode the stored subtree.
    pub fn snapshot(&self) -> Result<SectionDict, CoreError> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            CoreError::Internal(format!("Version {} holds an unreadable snapshot: {e}", self.id))
        })
    }
}

/// DTO for saving a version.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveVersion {
    #[serde(default)]
    pub activity: String,
}
