use pagetree_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `hierarchies` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HierarchyRow {
    pub id: DbId,
    pub name: String,
    pub base_url: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an empty hierarchy.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateHierarchy {
    pub name: String,
    #[serde(default)]
    pub base_url: String,
}
