//! Integration tests for content blocks and per-user progress.

use assert_matches::assert_matches;
use pagetree_core::block_type::{BlockContext, BlockTypeRegistry};
use pagetree_core::error::CoreError;
use pagetree_core::exchange::{BlockDict, SectionDict};
use pagetree_core::types::{DbId, Payload};
use pagetree_db::models::hierarchy::CreateHierarchy;
use pagetree_db::repositories::{
    HierarchyRepo, PageBlockRepo, PageVisitRepo, SectionRepo, UserVisitRepo,
};
use pagetree_db::DbError;
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn text(body: &str) -> BlockDict {
    serde_json::from_value(json!({ "block_type": "Text Block", "body": body })).unwrap()
}

fn values(v: serde_json::Value) -> Payload {
    serde_json::from_value(v).unwrap()
}

/// A hierarchy with two top-level sections. Returns (hierarchy, a, b).
async fn setup(pool: &PgPool) -> (DbId, DbId, DbId) {
    let registry = BlockTypeRegistry::with_defaults();
    let h = HierarchyRepo::create(
        pool,
        &CreateHierarchy {
            name: "main".to_string(),
            base_url: String::new(),
        },
    )
    .await
    .unwrap();
    let root = SectionRepo::find_root(pool, h.id).await.unwrap().unwrap().id;
    let a = SectionRepo::add_child(pool, root, &SectionDict::new("A", "a"), &registry)
        .await
        .unwrap();
    let b = SectionRepo::add_child(pool, root, &SectionDict::new("B", "b"), &registry)
        .await
        .unwrap();
    (h.id, a.id, b.id)
}

async fn bodies(pool: &PgPool, section_id: DbId) -> Vec<(String, i32)> {
    PageBlockRepo::list_by_section(pool, section_id)
        .await
        .unwrap()
        .into_iter()
        .map(|b| (b.payload.0["body"].as_str().unwrap_or_default().to_string(), b.ordinality))
        .collect()
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_blocks_in_order(pool: PgPool) {
    let registry = BlockTypeRegistry::with_defaults();
    let (_, a, _) = setup(&pool).await;

    PageBlockRepo::create(&pool, a, &text("first"), &registry).await.unwrap();
    PageBlockRepo::create(&pool, a, &text("second"), &registry).await.unwrap();

    assert_eq!(
        bodies(&pool, a).await,
        vec![("first".to_string(), 1), ("second".to_string(), 2)]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_block_unknown_type(pool: PgPool) {
    let registry = BlockTypeRegistry::with_defaults();
    let (_, a, _) = setup(&pool).await;
    let dict: BlockDict = serde_json::from_value(json!({ "block_type": "Quiz Block" })).unwrap();

    let err = PageBlockRepo::create(&pool, a, &dict, &registry).await.unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::Validation(_)));
    assert!(bodies(&pool, a).await.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_edit_block(pool: PgPool) {
    let registry = BlockTypeRegistry::with_defaults();
    let ctx = BlockContext::default();
    let (_, a, _) = setup(&pool).await;
    let block = PageBlockRepo::create(&pool, a, &text("draft"), &registry).await.unwrap();

    let edited = PageBlockRepo::edit(
        &pool,
        block.id,
        &values(json!({ "label": "Intro", "css_extra": "wide", "body": "final" })),
        &registry,
        &ctx,
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(edited.label, "Intro");
    assert_eq!(edited.css_extra, "wide");
    assert_eq!(edited.payload.0["body"], json!("final"));

    let err = PageBlockRepo::edit(
        &pool,
        block.id,
        &values(json!({ "label": "x".repeat(300) })),
        &registry,
        &ctx,
    )
    .await
    .unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::InvalidFields(ref f)) if f.contains("label"));

    let stored = PageBlockRepo::find_by_id(&pool, block.id).await.unwrap().unwrap();
    assert_eq!(stored.label, "Intro");

    let missing = PageBlockRepo::edit(&pool, 9999, &Payload::new(), &registry, &ctx)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reorder_and_delete_blocks(pool: PgPool) {
    let registry = BlockTypeRegistry::with_defaults();
    let (_, a, b) = setup(&pool).await;
    let mut ids = Vec::new();
    for body in ["one", "two", "three"] {
        ids.push(PageBlockRepo::create(&pool, a, &text(body), &registry).await.unwrap().id);
    }

    PageBlockRepo::reorder(&pool, a, &[ids[1], ids[2], ids[0]]).await.unwrap();
    assert_eq!(
        bodies(&pool, a).await,
        vec![("two".to_string(), 1), ("three".to_string(), 2), ("one".to_string(), 3)]
    );

    let err = PageBlockRepo::reorder(&pool, b, &ids).await.unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::Validation(_)));

    assert_eq!(PageBlockRepo::delete(&pool, ids[2]).await.unwrap(), Some(a));
    assert_eq!(PageBlockRepo::delete(&pool, ids[2]).await.unwrap(), None);
    assert_eq!(
        bodies(&pool, a).await,
        vec![("two".to_string(), 1), ("one".to_string(), 2)]
    );
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_latest_visit_tracks_location(pool: PgPool) {
    let (h, a, b) = setup(&pool).await;

    assert!(UserVisitRepo::latest_in_hierarchy(&pool, 7, h).await.unwrap().is_none());

    UserVisitRepo::record(&pool, 7, a).await.unwrap();
    UserVisitRepo::record(&pool, 7, b).await.unwrap();
    let latest = UserVisitRepo::latest_in_hierarchy(&pool, 7, h).await.unwrap().unwrap();
    assert_eq!(latest.section_id, b);

    let first = UserVisitRepo::find(&pool, 7, a).await.unwrap().unwrap();
    let again = UserVisitRepo::record(&pool, 7, a).await.unwrap();
    assert_eq!(again.id, first.id);
    assert!(again.last_visited > first.last_visited);

    let latest = UserVisitRepo::latest_in_hierarchy(&pool, 7, h).await.unwrap().unwrap();
    assert_eq!(latest.section_id, a);
    assert!(UserVisitRepo::latest_in_hierarchy(&pool, 8, h).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_page_status_last_write_wins(pool: PgPool) {
    let (_, a, _) = setup(&pool).await;

    assert!(PageVisitRepo::find(&pool, 7, a).await.unwrap().is_none());
    let first = PageVisitRepo::set_status(&pool, 7, a, "incomplete").await.unwrap();
    let second = PageVisitRepo::set_status(&pool, 7, a, "complete").await.unwrap();
    assert_eq!(first.id, second.id);

    let stored = PageVisitRepo::find(&pool, 7, a).await.unwrap().unwrap();
    assert_eq!(stored.status, "complete");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_progress_removed_with_section(pool: PgPool) {
    let (_, a, _) = setup(&pool).await;
    UserVisitRepo::record(&pool, 7, a).await.unwrap();
    PageVisitRepo::set_status(&pool, 7, a, "complete").await.unwrap();

    SectionRepo::delete(&pool, a).await.unwrap();
    assert!(UserVisitRepo::find(&pool, 7, a).await.unwrap().is_none());
    assert!(PageVisitRepo::find(&pool, 7, a).await.unwrap().is_none());
}
