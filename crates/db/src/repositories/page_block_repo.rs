//! Repository for the `page_blocks` table.

use pagetree_core::block::ContentBlock;
use pagetree_core::block_type::{BlockContext, BlockTypeRegistry};
use pagetree_core::exchange::{clean_block, BlockDict};
use pagetree_core::ordering::check_permutation;
use pagetree_core::types::{DbId, Payload};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::models::page_block::PageBlockRow;
use crate::repositories::section_repo;

/// Column list for page_blocks queries.
const COLUMNS: &str =
    "id, section_id, ordinality, label, css_extra, block_type, payload, created_at, updated_at";

/// Provides CRUD and ordering operations for content blocks.
pub struct PageBlockRepo;

impl PageBlockRepo {
    /// Find a block by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PageBlockRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM page_blocks WHERE id = $1");
        sqlx::query_as::<_, PageBlockRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the blocks of a section in order.
    pub async fn list_by_section(
        pool: &PgPool,
        section_id: DbId,
    ) -> Result<Vec<PageBlockRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM page_blocks WHERE section_id = $1 ORDER BY ordinality"
        );
        sqlx::query_as::<_, PageBlockRow>(&query)
            .bind(section_id)
            .fetch_all(pool)
            .await
    }

    /// List every block of a hierarchy.
    pub async fn list_by_hierarchy(
        pool: &PgPool,
        hierarchy_id: DbId,
    ) -> Result<Vec<PageBlockRow>, sqlx::Error> {
        sqlx::query_as::<_, PageBlockRow>(
            "SELECT b.id, b.section_id, b.ordinality, b.label, b.css_extra, b.block_type,
                    b.payload, b.created_at, b.updated_at
             FROM page_blocks b
             JOIN sections s ON s.id = b.section_id
             WHERE s.hierarchy_id = $1
             ORDER BY b.section_id, b.ordinality",
        )
        .bind(hierarchy_id)
        .fetch_all(pool)
        .await
    }

    /// Append a block to the end of a section.
    pub async fn create(
        pool: &PgPool,
        section_id: DbId,
        dict: &BlockDict,
        registry: &BlockTypeRegistry,
    ) -> Result<PageBlockRow, DbError> {
        let cleaned = clean_block(dict, registry)?;
        let mut tx = pool.begin().await?;

        section_repo::lock(&mut tx, section_id)
            .await?
            .ok_or_else(|| DbError::not_found("section", section_id))?;
        let (ordinality,): (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(ordinality), 0) + 1 FROM page_blocks WHERE section_id = $1",
        )
        .bind(section_id)
        .fetch_one(&mut *tx)
        .await?;
        let block = insert(&mut tx, section_id, ordinality, &cleaned).await?;

        tx.commit().await?;
        tracing::info!(section_id, block_id = block.id, "Block added");
        Ok(block)
    }

    /// Apply an edit submitted as one flat map of values.
    ///
    /// Returns `None` if the block does not exist. Validation failures are
    /// reported per field and leave the stored block untouched.
    pub async fn edit(
        pool: &PgPool,
        id: DbId,
        values: &Payload,
        registry: &BlockTypeRegistry,
        ctx: &BlockContext,
    ) -> Result<Option<PageBlockRow>, DbError> {
        let Some(row) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let mut block = ContentBlock::from(row);
        block.edit(values, registry, ctx)?;

        let query = format!(
            "UPDATE page_blocks SET label = $2, css_extra = $3, payload = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, PageBlockRow>(&query)
            .bind(id)
            .bind(&block.label)
            .bind(&block.css_extra)
            .bind(Json(&block.payload))
            .fetch_optional(pool)
            .await?;

        tracing::info!(block_id = id, "Block edited");
        Ok(updated)
    }

    /// Put the blocks of a section in the order given by `ids`.
    pub async fn reorder(pool: &PgPool, section_id: DbId, ids: &[DbId]) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;

        section_repo::lock(&mut tx, section_id)
            .await?
            .ok_or_else(|| DbError::not_found("section", section_id))?;
        let current: Vec<(DbId,)> =
            sqlx::query_as("SELECT id FROM page_blocks WHERE section_id = $1 ORDER BY ordinality")
                .bind(section_id)
                .fetch_all(&mut *tx)
                .await?;
        let current: Vec<DbId> = current.into_iter().map(|(c,)| c).collect();
        check_permutation(&current, ids, "blocks")?;

        sqlx::query(
            "UPDATE page_blocks b SET ordinality = o.ord::integer
             FROM UNNEST($1::bigint[]) WITH ORDINALITY AS o(id, ord)
             WHERE b.id = o.id AND b.section_id = $2",
        )
        .bind(ids)
        .bind(section_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(section_id, "Blocks reordered");
        Ok(())
    }

    /// Delete a block and shift later blocks down by one.
    ///
    /// Returns the owning section's id, or `None` if the block does not exist.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let owner: Option<(DbId,)> =
            sqlx::query_as("SELECT section_id FROM page_blocks WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((section_id,)) = owner else {
            return Ok(None);
        };
        section_repo::lock(&mut tx, section_id).await?;

        let removed: Option<(i32,)> =
            sqlx::query_as("DELETE FROM page_blocks WHERE id = $1 RETURNING ordinality")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((ordinality,)) = removed else {
            return Ok(None);
        };
        sqlx::query(
            "UPDATE page_blocks SET ordinality = ordinality - 1
             WHERE section_id = $1 AND ordinality > $2",
        )
        .bind(section_id)
        .bind(ordinality)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(block_id = id, section_id, "Block deleted");
        Ok(Some(section_id))
    }
}

pub(crate) async fn insert(
    conn: &mut PgConnection,
    section_id: DbId,
    ordinality: i32,
    dict: &BlockDict,
) -> Result<PageBlockRow, sqlx::Error> {
    let query = format!(
        "INSERT INTO page_blocks (section_id, ordinality, label, css_extra, block_type, payload)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, PageBlockRow>(&query)
        .bind(section_id)
        .bind(ordinality)
        .bind(&dict.label)
        .bind(&dict.css_extra)
        .bind(&dict.block_type)
        .bind(Json(&dict.payload))
        .fetch_one(&mut *conn)
        .await
}

pub(crate) async fn list_for_sections(
    conn: &mut PgConnection,
    section_ids: &[DbId],
) -> Result<Vec<PageBlockRow>, sqlx::Error> {
    let query = format!(
        "SELECT {COLUMNS} FROM page_blocks
         WHERE section_id = ANY($1)
         ORDER BY section_id, ordinality"
    );
    sqlx::query_as::<_, PageBlockRow>(&query)
        .bind(section_ids)
        .fetch_all(&mut *conn)
        .await
}

pub(crate) fn to_dict(row: &PageBlockRow) -> BlockDict {
    BlockDict {
        label: row.label.clone(),
        css_extra: row.css_extra.clone(),
        block_type: row.block_type.clone(),
        payload: row.payload.0.clone(),
    }
}
