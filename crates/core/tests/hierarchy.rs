//! End-to-end scenarios for the in-memory hierarchy engine.
//!
//! Builds small trees through the public API and checks:
//! - Empty hierarchy: root lookup, path resolution, leaves
//! - One level deep: paths, positions, document order, modules
//! - Blocks: rendering, editing, deletion renumbering, serialization
//! - User tracking: location and page status
//! - Versions: subtree snapshots and the "more recent" query

use pagetree_core::block_type::{
    BlockContext, BlockTypeRegistry, DEFAULT_BLOCK_FIELDS, SECTION_FIELDS, TEXT_BLOCK,
};
use pagetree_core::exchange::{BlockDict, SectionDict};
use pagetree_core::hierarchy::Hierarchy;
use pagetree_core::progress::{ProgressTracker, STATUS_COMPLETE, STATUS_INCOMPLETE};
use pagetree_core::registry::HierarchyRegistry;
use pagetree_core::types::{DbId, Payload};
use pagetree_core::version::VersionStore;
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn text(body: &str) -> BlockDict {
    serde_json::from_value(json!({
        "label": "",
        "css_extra": "",
        "block_type": TEXT_BLOCK,
        "body": body,
    }))
    .unwrap()
}

/// Hierarchy "main" with three top-level sections "Section 1..3".
fn one_level() -> (Hierarchy, [DbId; 3]) {
    let registry = BlockTypeRegistry::with_defaults();
    let mut h = Hierarchy::new(1, "main", "");
    let root = h.root_id();
    let mut ids = [0; 3];
    for (i, id) in ids.iter_mut().enumerate() {
        let n = i + 1;
        *id = h
            .add_child(
                root,
                &SectionDict::new(format!("Section {n}"), format!("section-{n}")),
                &registry,
            )
            .unwrap();
    }
    (h, ids)
}

/// "Section 1" with two text blocks, a child and a grandchild.
fn with_subtree() -> (Hierarchy, BlockTypeRegistry, DbId) {
    let registry = BlockTypeRegistry::with_defaults();
    let mut h = Hierarchy::new(1, "main", "");
    let mut grandchild = SectionDict::new("GrandChild 1", "grandchild-1");
    grandchild.pageblocks.push(text("deep text"));
    let mut child = SectionDict::new("Child 1", "child-1");
    child.children.push(grandchild);
    let mut section = SectionDict::new("Section 1", "section-1");
    section.pageblocks = vec![
        text("some body text section 1 block 1"),
        text("some body text section 1 block 2"),
    ];
    section.children.push(child);

    let id = h.add_child(h.root_id(), &section, &registry).unwrap();
    (h, registry, id)
}

// ---------------------------------------------------------------------------
// Empty hierarchy
// ---------------------------------------------------------------------------

#[test]
fn empty_hierarchy() {
    let h = Hierarchy::new(1, "main", "");
    let root = h.root();

    assert_eq!(h.name(), "main");
    assert_eq!(h.base_url(), "");
    assert_eq!(root.hierarchy_id, h.id());
    assert!(h.top_level().is_empty());
    assert!(h.find_section_from_path("/foo/bar/baz/").is_none());
    assert_eq!(h.find_section_from_path("/").map(|s| s.id), Some(root.id));
    assert_eq!(h.first_leaf(root.id).map(|s| s.id), Some(root.id));
    let last = h.last_leaf(root.id).unwrap();
    assert_eq!(h.first_leaf(last.id).map(|s| s.id), Some(root.id));
}

#[test]
fn empty_hierarchy_exports_no_sections() {
    let h = Hierarchy::new(1, "main", "");
    let value = serde_json::to_value(h.as_nested_dict()).unwrap();
    assert_eq!(value, json!({ "name": "main", "base_url": "", "sections": [] }));
}

#[test]
fn lookup_through_registry() {
    let mut registry = HierarchyRegistry::new();
    let id = registry.create("main", "").unwrap().id();
    assert_eq!(registry.lookup_by_name("main").map(|h| h.id()), Some(id));
    assert!(registry.lookup_by_name("nope").is_none());
}

// ---------------------------------------------------------------------------
// One level deep
// ---------------------------------------------------------------------------

#[test]
fn top_level_sections() {
    let (h, [s1, _, s3]) = one_level();
    assert_eq!(h.top_level().len(), 3);
    assert_eq!(h.section(s1).unwrap().label, "Section 1");
    assert_eq!(h.section(s1).unwrap().to_string(), "Section 1");
    assert_eq!(h.path(s1).as_deref(), Some("section-1/"));
    assert_eq!(h.absolute_url(s1).as_deref(), Some("section-1/"));
    assert_eq!(h.first_leaf(h.root_id()).map(|s| s.id), Some(s1));
    assert_eq!(h.last_leaf(h.root_id()).map(|s| s.id), Some(s3));
    assert_eq!(h.first_leaf(s1).map(|s| s.id), Some(s1));
    assert_eq!(h.last_leaf(s3).map(|s| s.id), Some(s3));
}

#[test]
fn paths_resolve_with_or_without_trailing_slash() {
    let (h, [s1, _, _]) = one_level();
    assert_eq!(h.find_section_from_path("section-1/").map(|s| s.id), Some(s1));
    assert_eq!(h.find_section_from_path("section-1").map(|s| s.id), Some(s1));
}

#[test]
fn first_and_last_children() {
    let (h, [s1, s2, s3]) = one_level();
    let root = h.root_id();
    assert!(h.is_first_child(root));
    assert!(h.is_first_child(s1));
    assert!(!h.is_first_child(s2));
    assert!(h.is_last_child(root));
    assert!(!h.is_last_child(s1));
    assert!(!h.is_last_child(s2));
    assert!(h.is_last_child(s3));
}

#[test]
fn previous_and_next() {
    let (h, [s1, s2, s3]) = one_level();
    assert!(h.previous(s1).is_none());
    assert_eq!(h.previous(s2).map(|s| s.id), Some(s1));
    assert_eq!(h.previous(s3).map(|s| s.id), Some(s2));
    assert!(h.previous(h.root_id()).is_none());

    assert_eq!(h.next(s1).map(|s| s.id), Some(s2));
    assert_eq!(h.next(s2).map(|s| s.id), Some(s3));
    assert!(h.next(s3).is_none());

    let back = h.previous(s2).unwrap().id;
    assert_eq!(h.next(back).map(|s| s.id), Some(s2));
}

#[test]
fn top_level_sections_are_modules() {
    let (h, [s1, _, _]) = one_level();
    assert!(h.module_of(h.root_id()).is_none());
    assert_eq!(h.module_of(s1).map(|s| s.id), Some(s1));
}

#[test]
fn form_schemas() {
    let section: Vec<_> = SECTION_FIELDS.iter().map(|f| f.name).collect();
    assert!(section.contains(&"label") && section.contains(&"slug"));
    let block: Vec<_> = DEFAULT_BLOCK_FIELDS.iter().map(|f| f.name).collect();
    assert!(block.contains(&"label") && block.contains(&"css_extra"));

    let registry = BlockTypeRegistry::with_defaults();
    let fields = registry.require(TEXT_BLOCK).unwrap().fields();
    assert_eq!(fields[0].name, "body");
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

#[test]
fn block_display_and_rendering() {
    let (h, registry, s1) = with_subtree();
    let ctx = BlockContext::default();
    let block = h.blocks_of(s1)[0];

    assert_eq!(h.block_title(block.id).as_deref(), Some("Section 1 [1]: "));
    assert_eq!(block.edit_label(&registry).unwrap(), "Text Block");
    assert_eq!(
        block.render(&registry, &ctx).unwrap(),
        "<p>some body text section 1 block 1</p>"
    );
    assert_eq!(block.render_js(&registry).unwrap(), "");
    assert_eq!(block.render_css(&registry).unwrap(), "");
    assert_eq!(
        block.render_summary(&registry, &ctx).unwrap(),
        "some body text section 1 block 1"
    );
}

#[test]
fn block_edit() {
    let (mut h, registry, s1) = with_subtree();
    let id = h.blocks_of(s1)[0].id;
    let values: Payload = json!({
        "label": "new label",
        "css_extra": "new css_extra",
        "body": "new_body",
    })
    .as_object()
    .cloned()
    .unwrap();

    h.edit_block(id, &values, &registry, &BlockContext::default())
        .unwrap();
    let block = h.block(id).unwrap();
    assert_eq!(block.label, "new label");
    assert_eq!(block.css_extra, "new css_extra");
    assert_eq!(block.text("body"), Some("new_body"));
}

#[test]
fn block_serialization() {
    let (h, _, s1) = with_subtree();
    let value = serde_json::to_value(h.blocks_of(s1)[0].to_dict()).unwrap();
    assert_eq!(
        value,
        json!({
            "label": "",
            "css_extra": "",
            "block_type": "Text Block",
            "body": "some body text section 1 block 1",
        })
    );
}

#[test]
fn deleting_first_block_renumbers_second() {
    let (mut h, _, s1) = with_subtree();
    let [first, second] = [h.blocks_of(s1)[0].id, h.blocks_of(s1)[1].id];
    h.remove_block(first).unwrap();
    assert_eq!(h.block(second).unwrap().ordinality, 1);
    h.check_invariants().unwrap();
}

#[test]
fn nested_export_round_trips() {
    let (h, registry, _) = with_subtree();
    let exported = h.as_nested_dict();
    let rebuilt = Hierarchy::from_nested_dict(2, &exported, &registry).unwrap();
    assert_eq!(rebuilt.as_nested_dict(), exported);
    assert_eq!(rebuilt.section_count(), h.section_count());
    assert_eq!(rebuilt.block_count(), h.block_count());
}

#[test]
fn ordinalities_stay_contiguous_through_mutations() {
    let (mut h, registry, s1) = with_subtree();
    let root = h.root_id();
    let s2 = h.add_child(root, &SectionDict::new("Section 2", "section-2"), &registry).unwrap();
    let s3 = h.add_child(root, &SectionDict::new("Section 3", "section-3"), &registry).unwrap();
    h.check_invariants().unwrap();

    h.reorder_children(root, &[s3, s1, s2]).unwrap();
    h.check_invariants().unwrap();

    let child = h.children(s1)[0].id;
    h.move_section(child, s3).unwrap();
    h.check_invariants().unwrap();
    assert_eq!(h.path(child).as_deref(), Some("section-3/child-1/"));

    h.remove_section(s1).unwrap();
    h.check_invariants().unwrap();
    let order: Vec<_> = h.top_level().iter().map(|s| (s.id, s.ordinality)).collect();
    assert_eq!(order, vec![(s3, 1), (s2, 2)]);
}

// ---------------------------------------------------------------------------
// User tracking
// ---------------------------------------------------------------------------

#[test]
fn user_visit_sets_location() {
    let (h, [s1, _, _]) = one_level();
    let mut tracker = ProgressTracker::new();
    tracker.record_visit(10, s1);
    assert_eq!(tracker.current_location(&h, 10), "section-1/");
    assert_eq!(tracker.current_section(&h, 10).id, s1);
}

#[test]
fn user_page_status() {
    let (_, [s1, _, _]) = one_level();
    let mut tracker = ProgressTracker::new();
    assert!(tracker.status(10, s1).is_none());
    tracker.record_page_status(10, s1, STATUS_INCOMPLETE);
    assert_eq!(tracker.status(10, s1), Some("incomplete"));
    tracker.record_page_status(10, s1, STATUS_COMPLETE);
    assert_eq!(tracker.status(10, s1), Some("complete"));
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

#[test]
fn save_version_snapshots_subtree() {
    let (h, _, s1) = with_subtree();
    let mut store = VersionStore::new();
    assert!(store.versions_for(s1).is_empty());

    let v = store.save_version(&h, s1, 10, "test save").unwrap().clone();
    assert_eq!(store.versions_for(s1).len(), 1);
    assert_eq!(v.activity, "test save");
    assert_eq!(v.user_id, 10);

    let data = v.data.to_string();
    assert!(data.contains("some body text section 1 block 1"));
    assert!(data.contains("some body text section 1 block 2"));
    assert!(data.contains("grandchild-1"));
    assert!(data.contains("deep text"));
}

#[test]
fn more_recent_versions_cover_descendants() {
    let (h, _, s1) = with_subtree();
    let mut store = VersionStore::new();
    let v1 = store.save_version(&h, s1, 10, "first").unwrap().clone();
    assert!(store.more_recent_versions(&h, &v1).is_empty());

    let grandchild = h.find_section_from_path("section-1/child-1/grandchild-1/").unwrap().id;
    store.save_version(&h, grandchild, 10, "deep edit").unwrap();
    let newer = store.more_recent_versions(&h, &v1);
    assert_eq!(newer.len(), 1);
    assert_eq!(newer[0].activity, "deep edit");
}
