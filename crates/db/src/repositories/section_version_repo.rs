//! Repository for the `section_versions` table.
//!
//! Versions are insert-only. Inserts take an exclusive table lock so that
//! `created_at` stays strictly increasing across concurrent writers.

use pagetree_core::block_type::BlockTypeRegistry;
use pagetree_core::error::CoreError;
use pagetree_core::exchange::{clean_contents, clean_section};
use pagetree_core::types::{DbId, UserId};
use pagetree_core::version::revert_activity;
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::models::section_version::SectionVersionRow;
use crate::repositories::section_repo::{self, SUBTREE_CTE};

/// Column list for section_versions queries.
const COLUMNS: &str = "id, section_id, user_id, activity, data, created_at, updated_at";

/// Saves, lists and restores subtree snapshots.
pub struct SectionVersionRepo;

impl SectionVersionRepo {
    /// Snapshot a section and its subtree as it is now.
    pub async fn save_version(
        pool: &PgPool,
        section_id: DbId,
        user_id: UserId,
        activity: &str,
    ) -> Result<SectionVersionRow, DbError> {
        let mut tx = pool.begin().await?;
        section_repo::lock(&mut tx, section_id)
            .await?
            .ok_or_else(|| DbError::not_found("section", section_id))?;
        let row = insert_snapshot(&mut tx, section_id, user_id, activity).await?;
        tx.commit().await?;

        tracing::info!(version_id = row.id, section_id, user_id, activity, "Version saved");
        Ok(row)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SectionVersionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM section_versions WHERE id = $1");
        sqlx::query_as::<_, SectionVersionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Versions of one section, oldest first.
    pub async fn list_by_section(
        pool: &PgPool,
        section_id: DbId,
    ) -> Result<Vec<SectionVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM section_versions WHERE section_id = $1 ORDER BY created_at"
        );
        sqlx::query_as::<_, SectionVersionRow>(&query)
            .bind(section_id)
            .fetch_all(pool)
            .await
    }

    /// Versions created after `version_id` for its section or any section
    /// currently below it, oldest first. `None` if the version is unknown.
    pub async fn more_recent(
        pool: &PgPool,
        version_id: DbId,
    ) -> Result<Option<Vec<SectionVersionRow>>, sqlx::Error> {
        let Some(version) = Self::find_by_id(pool, version_id).await? else {
            return Ok(None);
        };
        let query = format!(
            "{SUBTREE_CTE}
             SELECT {COLUMNS} FROM section_versions
             WHERE section_id IN (SELECT id FROM subtree) AND created_at > $2
             ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, SectionVersionRow>(&query)
            .bind(version.section_id)
            .bind(version.created_at)
            .fetch_all(pool)
            .await?;
        Ok(Some(rows))
    }

    /// Restore a section from a version and record the restore as a new
    /// version, all in one transaction.
    ///
    /// The snapshot is validated against the current registry and sibling
    /// slugs before anything is replaced.
    pub async fn revert(
        pool: &PgPool,
        version_id: DbId,
        user_id: UserId,
        registry: &BlockTypeRegistry,
    ) -> Result<SectionVersionRow, DbError> {
        let version = Self::find_by_id(pool, version_id)
            .await?
            .ok_or_else(|| DbError::not_found("version", version_id))?;
        let snapshot = version.snapshot()?;

        let mut tx = pool.begin().await?;
        let section = section_repo::lock(&mut tx, version.section_id)
            .await?
            .ok_or_else(|| DbError::not_found("section", version.section_id))?;

        let cleaned = match section.parent_id {
            None => clean_contents(&snapshot, registry, true)?,
            Some(parent_id) => {
                let (top_level,): (bool,) =
                    sqlx::query_as("SELECT parent_id IS NULL FROM sections WHERE id = $1")
                        .bind(parent_id)
                        .fetch_one(&mut *tx)
                        .await?;
                let cleaned = clean_section(&snapshot, registry, top_level)?;
                section_repo::ensure_slug_free(&mut tx, parent_id, &cleaned.slug, Some(section.id))
                    .await?;
                cleaned
            }
        };
        section_repo::replace_contents(&mut tx, &section, &cleaned).await?;
        let row =
            insert_snapshot(&mut tx, section.id, user_id, &revert_activity(version_id)).await?;
        tx.commit().await?;

        tracing::info!(
            version_id,
            section_id = section.id,
            new_version_id = row.id,
            user_id,
            "Section reverted"
        );
        Ok(row)
    }
}

async fn insert_snapshot(
    conn: &mut PgConnection,
    section_id: DbId,
    user_id: UserId,
    activity: &str,
) -> Result<SectionVersionRow, DbError> {
    let dict = section_repo::subtree_as_dict(conn, section_id)
        .await?
        .ok_or_else(|| DbError::not_found("section", section_id))?;
    let data = serde_json::to_value(&dict)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize section: {e}")))?;

    sqlx::query("LOCK TABLE section_versions IN EXCLUSIVE MODE")
        .execute(&mut *conn)
        .await?;
    let query = format!(
        "INSERT INTO section_versions (section_id, user_id, activity, data, created_at)
         VALUES ($1, $2, $3, $4, GREATEST(
             clock_timestamp(),
             (SELECT MAX(created_at) FROM section_versions) + INTERVAL '1 microsecond'
         ))
         RETURNING {COLUMNS}"
    );
    let row = sqlx::query_as::<_, SectionVersionRow>(&query)
        .bind(section_id)
        .bind(user_id)
        .bind(activity)
        .bind(data)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row)
}
