//! Repository for the `sections` table.
//!
//! Every structural change locks the parent row with `SELECT ... FOR UPDATE`
//! before reading sibling ordinalities, and runs in one transaction. The
//! `(parent_id, ordinality)` constraint is deferred to commit, so gaps can be
//! closed with a single shifting `UPDATE`.

use std::collections::HashMap;

use pagetree_core::block_type::BlockTypeRegistry;
use pagetree_core::error::CoreError;
use pagetree_core::exchange::{clean_section, SectionDict};
use pagetree_core::ordering::check_permutation;
use pagetree_core::section::SectionUpdate;
use pagetree_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::models::page_block::PageBlockRow;
use crate::models::section::SectionRow;
use crate::repositories::page_block_repo;

/// Column list for sections queries.
pub(crate) const COLUMNS: &str =
    "id, hierarchy_id, parent_id, label, slug, ordinality, is_module, created_at, updated_at";

/// Ids of a section and all its descendants. Bind the section id as `$1`.
pub(crate) const SUBTREE_CTE: &str = "WITH RECURSIVE subtree AS (
        SELECT id FROM sections WHERE id = $1
        UNION ALL
        SELECT s.id FROM sections s JOIN subtree t ON s.parent_id = t.id
    )";

/// Provides tree operations on sections.
pub struct SectionRepo;

impl SectionRepo {
    /// Find a section by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SectionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sections WHERE id = $1");
        sqlx::query_as::<_, SectionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the root section of a hierarchy.
    pub async fn find_root(pool: &PgPool, hierarchy_id: DbId) -> Result<Option<SectionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sections WHERE hierarchy_id = $1 AND parent_id IS NULL"
        );
        sqlx::query_as::<_, SectionRow>(&query)
            .bind(hierarchy_id)
            .fetch_optional(pool)
            .await
    }

    /// List the children of a section in order.
    pub async fn list_children(pool: &PgPool, id: DbId) -> Result<Vec<SectionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sections WHERE parent_id = $1 ORDER BY ordinality"
        );
        sqlx::query_as::<_, SectionRow>(&query)
            .bind(id)
            .fetch_all(pool)
            .await
    }

    /// List every section of a hierarchy.
    pub async fn list_by_hierarchy(
        pool: &PgPool,
        hierarchy_id: DbId,
    ) -> Result<Vec<SectionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sections WHERE hierarchy_id = $1 ORDER BY parent_id NULLS FIRST, ordinality"
        );
        sqlx::query_as::<_, SectionRow>(&query)
            .bind(hierarchy_id)
            .fetch_all(pool)
            .await
    }

    /// Import `dict` and its subtree as the last child of `parent_id`.
    pub async fn add_child(
        pool: &PgPool,
        parent_id: DbId,
        dict: &SectionDict,
        registry: &BlockTypeRegistry,
    ) -> Result<SectionRow, DbError> {
        let mut tx = pool.begin().await?;

        let parent = lock(&mut tx, parent_id)
            .await?
            .ok_or_else(|| DbError::not_found("section", parent_id))?;
        let cleaned = clean_section(dict, registry, parent.is_root())?;
        ensure_slug_free(&mut tx, parent_id, &cleaned.slug, None).await?;

        let ordinality = next_child_ordinality(&mut tx, parent_id, None).await?;
        let section =
            insert_subtree(&mut tx, parent.hierarchy_id, parent_id, ordinality, &cleaned).await?;

        tx.commit().await?;
        tracing::info!(
            hierarchy_id = parent.hierarchy_id,
            parent_id,
            section_id = section.id,
            sections = cleaned.section_count(),
            "Section added"
        );
        Ok(section)
    }

    /// Update a section's label, slug or module flag.
    ///
    /// Returns `None` if the section does not exist.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &SectionUpdate,
    ) -> Result<Option<SectionRow>, DbError> {
        input.check()?;
        let mut tx = pool.begin().await?;

        let Some(section) = lock(&mut tx, id).await? else {
            return Ok(None);
        };
        if let Some(slug) = &input.slug {
            match section.parent_id {
                None => return Err(DbError::validation("The root section has no slug")),
                Some(parent_id) => ensure_slug_free(&mut tx, parent_id, slug, Some(id)).await?,
            }
        }

        let query = format!(
            "UPDATE sections SET
                label = COALESCE($2, label),
                slug = COALESCE($3, slug),
                is_module = COALESCE($4, is_module)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, SectionRow>(&query)
            .bind(id)
            .bind(&input.label)
            .bind(&input.slug)
            .bind(input.is_module)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(section_id = id, "Section edited");
        Ok(Some(updated))
    }

    /// Put the children of `id` in the order given by `ids`.
    pub async fn reorder_children(pool: &PgPool, id: DbId, ids: &[DbId]) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;

        lock(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("section", id))?;
        let current: Vec<(DbId,)> =
            sqlx::query_as("SELECT id FROM sections WHERE parent_id = $1 ORDER BY ordinality")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
        let current: Vec<DbId> = current.into_iter().map(|(c,)| c).collect();
        check_permutation(&current, ids, "children")?;

        sqlx::query(
            "UPDATE sections s SET ordinality = o.ord::integer
             FROM UNNEST($1::bigint[]) WITH ORDINALITY AS o(id, ord)
             WHERE s.id = o.id AND s.parent_id = $2",
        )
        .bind(ids)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(section_id = id, "Children reordered");
        Ok(())
    }

    /// Re-parent a section as the last child of `new_parent_id`.
    pub async fn move_section(
        pool: &PgPool,
        id: DbId,
        new_parent_id: DbId,
    ) -> Result<SectionRow, DbError> {
        let mut tx = pool.begin().await?;

        let section = lock(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("section", id))?;
        let Some(old_parent_id) = section.parent_id else {
            tracing::warn!(section_id = id, "Rejected move of the root section");
            return Err(DbError::validation("The root section cannot be moved"));
        };
        let new_parent = lock(&mut tx, new_parent_id)
            .await?
            .ok_or_else(|| DbError::not_found("section", new_parent_id))?;
        if new_parent.hierarchy_id != section.hierarchy_id {
            return Err(DbError::validation("Sections cannot move between hierarchies"));
        }

        let query = format!("{SUBTREE_CTE} SELECT EXISTS (SELECT 1 FROM subtree WHERE id = $2)");
        let (inside,): (bool,) = sqlx::query_as(&query)
            .bind(id)
            .bind(new_parent_id)
            .fetch_one(&mut *tx)
            .await?;
        if inside {
            tracing::warn!(section_id = id, new_parent_id, "Rejected move under own subtree");
            return Err(DbError::validation(format!(
                "Section {id} cannot be moved under itself or its descendants"
            )));
        }
        ensure_slug_free(&mut tx, new_parent_id, &section.slug, Some(id)).await?;

        lock(&mut tx, old_parent_id).await?;
        close_child_gap(&mut tx, old_parent_id, section.ordinality).await?;
        let ordinality = next_child_ordinality(&mut tx, new_parent_id, Some(id)).await?;
        let query = format!(
            "UPDATE sections SET parent_id = $2, ordinality = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let moved = sqlx::query_as::<_, SectionRow>(&query)
            .bind(id)
            .bind(new_parent_id)
            .bind(ordinality)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(section_id = id, old_parent_id, new_parent_id, "Section moved");
        Ok(moved)
    }

    /// Delete a section with its subtree and blocks, closing the gap among
    /// its former siblings. Returns `false` if the section does not exist.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, DbError> {
        let mut tx = pool.begin().await?;

        let Some(section) = lock(&mut tx, id).await? else {
            return Ok(false);
        };
        let Some(parent_id) = section.parent_id else {
            tracing::warn!(section_id = id, "Rejected delete of the root section");
            return Err(DbError::validation("The root section cannot be deleted"));
        };
        lock(&mut tx, parent_id).await?;

        sqlx::query("DELETE FROM sections WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        close_child_gap(&mut tx, parent_id, section.ordinality).await?;

        tx.commit().await?;
        tracing::info!(section_id = id, parent_id, "Section deleted");
        Ok(true)
    }

    /// Ids of a section and all its descendants.
    pub async fn subtree_ids(pool: &PgPool, id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        subtree_ids(&mut conn, id).await
    }

    /// Export a section and its subtree in the exchange format.
    pub async fn subtree_as_dict(pool: &PgPool, id: DbId) -> Result<Option<SectionDict>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        subtree_as_dict(&mut conn, id).await
    }
}

// ---------------------------------------------------------------------------
// Transaction helpers
// ---------------------------------------------------------------------------

/// Lock a section row for the rest of the transaction.
pub(crate) async fn lock(
    conn: &mut PgConnection,
    id: DbId,
) -> Result<Option<SectionRow>, sqlx::Error> {
    let query = format!("SELECT {COLUMNS} FROM sections WHERE id = $1 FOR UPDATE");
    sqlx::query_as::<_, SectionRow>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

/// Fail with a conflict if a child of `parent_id` other than `except`
/// already uses `slug`.
pub(crate) async fn ensure_slug_free(
    conn: &mut PgConnection,
    parent_id: DbId,
    slug: &str,
    except: Option<DbId>,
) -> Result<(), DbError> {
    let (taken,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (
            SELECT 1 FROM sections
            WHERE parent_id = $1 AND slug = $2 AND id IS DISTINCT FROM $3
        )",
    )
    .bind(parent_id)
    .bind(slug)
    .bind(except)
    .fetch_one(&mut *conn)
    .await?;

    if taken {
        tracing::warn!(parent_id, slug, "Duplicate sibling slug");
        return Err(DbError::Core(CoreError::Conflict(format!(
            "A section with slug '{slug}' already exists here"
        ))));
    }
    Ok(())
}

/// Ordinality for a new last child of `parent_id`. The `moving` row is left
/// out so a section moved within its own parent lands right after the
/// renumbered siblings.
async fn next_child_ordinality(
    conn: &mut PgConnection,
    parent_id: DbId,
    moving: Option<DbId>,
) -> Result<i32, sqlx::Error> {
    let (next,): (i32,) = sqlx::query_as(
        "SELECT COALESCE(MAX(ordinality), 0) + 1 FROM sections
         WHERE parent_id = $1 AND ($2::bigint IS NULL OR id <> $2)",
    )
    .bind(parent_id)
    .bind(moving)
    .fetch_one(&mut *conn)
    .await?;
    Ok(next)
}

async fn close_child_gap(
    conn: &mut PgConnection,
    parent_id: DbId,
    removed: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE sections SET ordinality = ordinality - 1
         WHERE parent_id = $1 AND ordinality > $2",
    )
    .bind(parent_id)
    .bind(removed)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Insert a cleaned record, its blocks and its descendants. Returns the
/// row of the top section.
pub(crate) async fn insert_subtree(
    conn: &mut PgConnection,
    hierarchy_id: DbId,
    parent_id: DbId,
    ordinality: i32,
    dict: &SectionDict,
) -> Result<SectionRow, sqlx::Error> {
    let top = insert_section(conn, hierarchy_id, parent_id, ordinality, dict).await?;
    insert_contents(conn, hierarchy_id, top.id, dict).await?;
    Ok(top)
}

/// Insert the blocks and the child subtrees of `dict` under `section_id`.
pub(crate) async fn insert_contents(
    conn: &mut PgConnection,
    hierarchy_id: DbId,
    section_id: DbId,
    dict: &SectionDict,
) -> Result<(), sqlx::Error> {
    let mut pending: Vec<(DbId, &SectionDict)> = vec![(section_id, dict)];
    while let Some((id, current)) = pending.pop() {
        for (i, block) in current.pageblocks.iter().enumerate() {
            page_block_repo::insert(conn, id, i as i32 + 1, block).await?;
        }
        for (i, child) in current.children.iter().enumerate() {
            let row = insert_section(conn, hierarchy_id, id, i as i32 + 1, child).await?;
            pending.push((row.id, child));
        }
    }
    Ok(())
}

async fn insert_section(
    conn: &mut PgConnection,
    hierarchy_id: DbId,
    parent_id: DbId,
    ordinality: i32,
    dict: &SectionDict,
) -> Result<SectionRow, sqlx::Error> {
    let query = format!(
        "INSERT INTO sections (hierarchy_id, parent_id, label, slug, ordinality, is_module)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, SectionRow>(&query)
        .bind(hierarchy_id)
        .bind(parent_id)
        .bind(&dict.label)
        .bind(&dict.slug)
        .bind(ordinality)
        .bind(dict.is_module.unwrap_or(false))
        .fetch_one(&mut *conn)
        .await
}

/// Replace the label, slug, module flag, blocks and children of a locked
/// section with a cleaned record. The root keeps its slug and flag.
pub(crate) async fn replace_contents(
    conn: &mut PgConnection,
    section: &SectionRow,
    dict: &SectionDict,
) -> Result<SectionRow, sqlx::Error> {
    sqlx::query("DELETE FROM sections WHERE parent_id = $1")
        .bind(section.id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM page_blocks WHERE section_id = $1")
        .bind(section.id)
        .execute(&mut *conn)
        .await?;

    let (slug, is_module) = if section.is_root() {
        (section.slug.clone(), section.is_module)
    } else {
        (dict.slug.clone(), dict.is_module.unwrap_or(section.is_module))
    };
    let query = format!(
        "UPDATE sections SET label = $2, slug = $3, is_module = $4
         WHERE id = $1
         RETURNING {COLUMNS}"
    );
    let updated = sqlx::query_as::<_, SectionRow>(&query)
        .bind(section.id)
        .bind(&dict.label)
        .bind(slug)
        .bind(is_module)
        .fetch_one(&mut *conn)
        .await?;

    insert_contents(conn, section.hierarchy_id, section.id, dict).await?;
    Ok(updated)
}

pub(crate) async fn subtree_ids(conn: &mut PgConnection, id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
    let query = format!("{SUBTREE_CTE} SELECT id FROM subtree");
    let rows: Vec<(DbId,)> = sqlx::query_as(&query)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Load a section's subtree and its blocks in two queries and assemble the
/// exchange record. The module flag is always filled in.
pub(crate) async fn subtree_as_dict(
    conn: &mut PgConnection,
    id: DbId,
) -> Result<Option<SectionDict>, sqlx::Error> {
    let ids = subtree_ids(conn, id).await?;
    if ids.is_empty() {
        return Ok(None);
    }

    let query = format!("SELECT {COLUMNS} FROM sections WHERE id = ANY($1) ORDER BY ordinality");
    let sections = sqlx::query_as::<_, SectionRow>(&query)
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?;
    let blocks = page_block_repo::list_for_sections(conn, &ids).await?;

    let mut blocks_by_section: HashMap<DbId, Vec<PageBlockRow>> = HashMap::new();
    for block in blocks {
        blocks_by_section.entry(block.section_id).or_default().push(block);
    }
    let mut children_by_parent: HashMap<DbId, Vec<&SectionRow>> = HashMap::new();
    let mut top = None;
    for section in &sections {
        if section.id == id {
            top = Some(section);
        } else if let Some(parent_id) = section.parent_id {
            children_by_parent.entry(parent_id).or_default().push(section);
        }
    }

    Ok(top.map(|row| build_dict(row, &children_by_parent, &blocks_by_section)))
}

fn build_dict(
    row: &SectionRow,
    children: &HashMap<DbId, Vec<&SectionRow>>,
    blocks: &HashMap<DbId, Vec<PageBlockRow>>,
) -> SectionDict {
    SectionDict {
        label: row.label.clone(),
        slug: row.slug.clone(),
        is_module: Some(row.is_module),
        pageblocks: blocks
            .get(&row.id)
            .map(|bs| bs.iter().map(page_block_repo::to_dict).collect())
            .unwrap_or_default(),
        children: children
            .get(&row.id)
            .map(|cs| cs.iter().map(|c| build_dict(c, children, blocks)).collect())
            .unwrap_or_default(),
    }
}
