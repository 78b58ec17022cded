use pagetree_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_visits` table: where a user last was.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserVisitRow {
    pub id: DbId,
    pub user_id: DbId,
    pub section_id: DbId,
    pub last_visited: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
