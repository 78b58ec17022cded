//! Repository for the `page_visits` table.

use pagetree_core::types::{DbId, UserId};
use sqlx::PgPool;

use crate::models::page_visit::PageVisitRow;

/// Column list for page_visits queries.
const COLUMNS: &str = "id, user_id, section_id, status, created_at, updated_at";

/// Stores one completion status per (user, section).
pub struct PageVisitRepo;

impl PageVisitRepo {
    /// Set the status, creating the record on first use.
    pub async fn set_status(
        pool: &PgPool,
        user_id: UserId,
        section_id: DbId,
        status: &str,
    ) -> Result<PageVisitRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO page_visits (user_id, section_id, status)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_page_visits_user_section
             DO UPDATE SET status = EXCLUDED.status
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, PageVisitRow>(&query)
            .bind(user_id)
            .bind(section_id)
            .bind(status)
            .fetch_one(pool)
            .await?;

        tracing::debug!(user_id, section_id, status, "Page status recorded");
        Ok(row)
    }

    pub async fn find(
        pool: &PgPool,
        user_id: UserId,
        section_id: DbId,
    ) -> Result<Option<PageVisitRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM page_visits WHERE user_id = $1 AND section_id = $2");
        sqlx::query_as::<_, PageVisitRow>(&query)
            .bind(user_id)
            .bind(section_id)
            .fetch_optional(pool)
            .await
    }
}
