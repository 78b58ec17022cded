//! Repository for the `hierarchies` table.
//!
//! A hierarchy row is always created together with its root section.

use pagetree_core::block_type::BlockTypeRegistry;
use pagetree_core::exchange::HierarchyDict;
use pagetree_core::hierarchy::{Hierarchy, ROOT_LABEL};
use pagetree_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::models::hierarchy::{CreateHierarchy, HierarchyRow};
use crate::repositories::page_block_repo::PageBlockRepo;
use crate::repositories::section_repo::{self, SectionRepo};

/// Column list for hierarchies queries.
const COLUMNS: &str = "id, name, base_url, created_at, updated_at";

/// Provides CRUD, import and export for hierarchies.
pub struct HierarchyRepo;

impl HierarchyRepo {
    /// Create an empty hierarchy and its root section.
    pub async fn create(pool: &PgPool, input: &CreateHierarchy) -> Result<HierarchyRow, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let row = insert_with_root(&mut tx, &input.name, &input.base_url).await?;
        tx.commit().await?;

        tracing::info!(hierarchy_id = row.id, name = %row.name, "Hierarchy created");
        Ok(row)
    }

    /// Find a hierarchy by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<HierarchyRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM hierarchies WHERE id = $1");
        sqlx::query_as::<_, HierarchyRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a hierarchy by its unique name.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<HierarchyRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM hierarchies WHERE name = $1");
        sqlx::query_as::<_, HierarchyRow>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// List all hierarchies ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<HierarchyRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM hierarchies ORDER BY name");
        sqlx::query_as::<_, HierarchyRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Delete a hierarchy and, by cascade, its whole tree.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM hierarchies WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() > 0 {
            tracing::info!(hierarchy_id = id, "Hierarchy deleted");
        }
        Ok(result.rows_affected() > 0)
    }

    /// Create a hierarchy from the exchange format in one transaction.
    ///
    /// The record is validated in full before anything is written.
    pub async fn import(
        pool: &PgPool,
        dict: &HierarchyDict,
        registry: &BlockTypeRegistry,
    ) -> Result<HierarchyRow, DbError> {
        let cleaned = Hierarchy::from_nested_dict(0, dict, registry)?.as_nested_dict();

        let mut tx = pool.begin().await?;
        let row = insert_with_root(&mut tx, &cleaned.name, &cleaned.base_url).await?;
        let root_query = "SELECT id FROM sections WHERE hierarchy_id = $1 AND parent_id IS NULL";
        let (root_id,): (DbId,) = sqlx::query_as(root_query)
            .bind(row.id)
            .fetch_one(&mut *tx)
            .await?;
        for (i, section) in cleaned.sections.iter().enumerate() {
            section_repo::insert_subtree(&mut tx, row.id, root_id, i as i32 + 1, section).await?;
        }
        tx.commit().await?;

        tracing::info!(
            hierarchy_id = row.id,
            name = %row.name,
            sections = cleaned.sections.iter().map(|s| s.section_count()).sum::<usize>(),
            "Hierarchy imported"
        );
        Ok(row)
    }

    /// Load a whole hierarchy into memory.
    ///
    /// Section and block ids in the result are the database ids.
    pub async fn load_tree(pool: &PgPool, id: DbId) -> Result<Option<Hierarchy>, DbError> {
        let Some(row) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let sections = SectionRepo::list_by_hierarchy(pool, id).await?;
        let blocks = PageBlockRepo::list_by_hierarchy(pool, id).await?;

        let tree = Hierarchy::assemble(
            row.id,
            row.name,
            row.base_url,
            sections.into_iter().map(Into::into).collect(),
            blocks.into_iter().map(Into::into).collect(),
        )?;
        Ok(Some(tree))
    }

    /// [`HierarchyRepo::load_tree`] by hierarchy name.
    pub async fn load_tree_by_name(pool: &PgPool, name: &str) -> Result<Option<Hierarchy>, DbError> {
        match Self::find_by_name(pool, name).await? {
            Some(row) => Self::load_tree(pool, row.id).await,
            None => Ok(None),
        }
    }

    /// Export a hierarchy in the exchange format.
    pub async fn export(pool: &PgPool, name: &str) -> Result<Option<HierarchyDict>, DbError> {
        let tree = Self::load_tree_by_name(pool, name).await?;
        Ok(tree.map(|t| t.as_nested_dict()))
    }
}

async fn insert_with_root(
    conn: &mut PgConnection,
    name: &str,
    base_url: &str,
) -> Result<HierarchyRow, sqlx::Error> {
    let query = format!(
        "INSERT INTO hierarchies (name, base_url)
         VALUES ($1, $2)
         RETURNING {COLUMNS}"
    );
    let row = sqlx::query_as::<_, HierarchyRow>(&query)
        .bind(name)
        .bind(base_url)
        .fetch_one(&mut *conn)
        .await?;

    sqlx::query(
        "INSERT INTO sections (hierarchy_id, parent_id, label, slug, ordinality, is_module)
         VALUES ($1, NULL, $2, '', 1, false)",
    )
    .bind(row.id)
    .bind(ROOT_LABEL)
    .execute(&mut *conn)
    .await?;

    Ok(row)
}

