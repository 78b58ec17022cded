use pagetree_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `page_visits` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PageVisitRow {
    pub id: DbId,
    pub user_id: DbId,
    pub section_id: DbId,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording a page status.
#[derive(Debug, Clone, Deserialize)]
pub struct SetPageStatus {
    pub status: String,
}
