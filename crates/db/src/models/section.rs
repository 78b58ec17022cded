use pagetree_core::section::SectionRecord;
use pagetree_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `sections` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SectionRow {
    pub id: DbId,
    pub hierarchy_id: DbId,
    pub parent_id: Option<DbId>,
    pub label: String,
    pub slug: String,
    pub ordinality: i32,
    pub is_module: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SectionRow {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl From<SectionRow> for SectionRecord {
    fn from(row: SectionRow) -> Self {
        SectionRecord {
            id: row.id,
            parent_id: row.parent_id,
            label: row.label,
            slug: row.slug,
            ordinality: row.ordinality,
            is_module: row.is_module,
        }
    }
}
