//! Repository for the `user_visits` table.

use pagetree_core::types::{DbId, UserId};
use sqlx::PgPool;

use crate::models::user_visit::UserVisitRow;

/// Column list for user_visits queries.
const COLUMNS: &str = "id, user_id, section_id, last_visited, created_at, updated_at";

/// Tracks where each user was last.
pub struct UserVisitRepo;

impl UserVisitRepo {
    /// Record that `user_id` is viewing `section_id` now.
    ///
    /// There is at most one row per (user, section); revisits move its
    /// timestamp forward.
    pub async fn record(
        pool: &PgPool,
        user_id: UserId,
        section_id: DbId,
    ) -> Result<UserVisitRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_visits (user_id, section_id, last_visited)
             VALUES ($1, $2, clock_timestamp())
             ON CONFLICT ON CONSTRAINT uq_user_visits_user_section
             DO UPDATE SET last_visited = GREATEST(clock_timestamp(), user_visits.last_visited + INTERVAL '1 microsecond')
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserVisitRow>(&query)
            .bind(user_id)
            .bind(section_id)
            .fetch_one(pool)
            .await?;

        tracing::debug!(user_id, section_id, "Visit recorded");
        Ok(row)
    }

    /// The visit record for one (user, section) pair.
    pub async fn find(
        pool: &PgPool,
        user_id: UserId,
        section_id: DbId,
    ) -> Result<Option<UserVisitRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_visits WHERE user_id = $1 AND section_id = $2");
        sqlx::query_as::<_, UserVisitRow>(&query)
            .bind(user_id)
            .bind(section_id)
            .fetch_optional(pool)
            .await
    }

    /// The most recent visit of a user anywhere in one hierarchy.
    pub async fn latest_in_hierarchy(
        pool: &PgPool,
        user_id: UserId,
        hierarchy_id: DbId,
    ) -> Result<Option<UserVisitRow>, sqlx::Error> {
        sqlx::query_as::<_, UserVisitRow>(
            "SELECT v.id, v.user_id, v.section_id, v.last_visited, v.created_at, v.updated_at
             FROM user_visits v
             JOIN sections s ON s.id = v.section_id
             WHERE v.user_id = $1 AND s.hierarchy_id = $2
             ORDER BY v.last_visited DESC, v.id DESC
             LIMIT 1",
        )
        .bind(user_id)
        .bind(hierarchy_id)
        .fetch_optional(pool)
        .await
    }
}
