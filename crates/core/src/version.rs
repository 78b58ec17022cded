//! Immutable subtree snapshots.
//!
//! A [`Version`] stores one section and everything below it in the exchange
//! format, stamped with author, time and a short activity description.
//! Timestamps come from a [`MonotonicClock`], so versions are totally ordered.

use std::collections::HashSet;

use serde::Serialize;

use crate::block_type::BlockTypeRegistry;
use crate::clock::MonotonicClock;
use crate::error::CoreError;
use crate::exchange::SectionDict;
use crate::hierarchy::Hierarchy;
use crate::types::{DbId, Timestamp, UserId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Version {
    pub id: DbId,
    pub section_id: DbId,
    pub user_id: UserId,
    pub created_at: Timestamp,
    pub activity: String,
    pub data: serde_json::Value,
}

impl Version {
    /// Decode the stored subtree.
    pub fn snapshot(&self) -> Result<SectionDict, CoreError> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            CoreError::Internal(format!("Version {} holds an unreadable snapshot: {e}", self.id))
        })
    }
}

/// Activity recorded when a section is restored from a version.
pub fn revert_activity(version_id: DbId) -> String {
    format!("Reverted to version {version_id}")
}

/// Snapshots kept in memory, in creation order.
#[derive(Debug, Default)]
pub struct VersionStore {
    versions: Vec<Version>,
    next_id: DbId,
    clock: MonotonicClock,
}

impl VersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot `section_id` and its subtree as it is now.
    pub fn save_version(
        &mut self,
        hierarchy: &Hierarchy,
        section_id: DbId,
        user_id: UserId,
        activity: &str,
    ) -> Result<&Version, CoreError> {
        let dict = hierarchy.section_as_dict(section_id)?;
        let data = serde_json::to_value(&dict)
            .map_err(|e| CoreError::Internal(format!("Failed to serialize section: {e}")))?;

        self.next_id += 1;
        let version = Version {
            id: self.next_id,
            section_id,
            user_id,
            created_at: self.clock.now(),
            activity: activity.to_string(),
            data,
        };
        tracing::info!(
            version_id = version.id,
            section_id,
            user_id,
            activity,
            "Version saved"
        );
        self.versions.push(version);
        Ok(&self.versions[self.versions.len() - 1])
    }

    pub fn get(&self, id: DbId) -> Option<&Version> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Versions of one section, oldest first.
    pub fn versions_for(&self, section_id: DbId) -> Vec<&Version> {
        self.versions
            .iter()
            .filter(|v| v.section_id == section_id)
            .collect()
    }

    /// Versions newer than `version` of its section or any section
    /// currently below it, oldest first.
    pub fn more_recent_versions(&self, hierarchy: &Hierarchy, version: &Version) -> Vec<&Version> {
        let subtree: HashSet<DbId> = hierarchy
            .subtree_ids(version.section_id)
            .into_iter()
            .collect();
        self.versions
            .iter()
            .filter(|v| subtree.contains(&v.section_id) && v.created_at > version.created_at)
            .collect()
    }

    /// Restore a section from a version and record the restore as a new
    /// version. Returns the new version and the ids of the sections the
    /// restore removed.
    pub fn revert_to_version(
        &mut self,
        hierarchy: &mut Hierarchy,
        version_id: DbId,
        user_id: UserId,
        registry: &BlockTypeRegistry,
    ) -> Result<(&Version, Vec<DbId>), CoreError> {
        let version = self.get(version_id).ok_or(CoreError::NotFound {
            entity: "version",
            id: version_id,
        })?;
        let section_id = version.section_id;
        let snapshot = version.snapshot()?;

        let removed = hierarchy.replace_section(section_id, &snapshot, registry)?;
        self.forget_sections(&removed);
        let saved = self.save_version(hierarchy, section_id, user_id, &revert_activity(version_id))?;
        Ok((saved, removed))
    }

    /// Drop the versions of deleted sections.
    pub fn forget_sections(&mut self, section_ids: &[DbId]) {
        self.versions.retain(|v| !section_ids.contains(&v.section_id));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::block_type::TEXT_BLOCK;
    use crate::exchange::BlockDict;

    fn tree() -> (Hierarchy, BlockTypeRegistry, DbId, DbId) {
        let registry = BlockTypeRegistry::with_defaults();
        let mut h = Hierarchy::new(1, "main", "");
        let mut dict = SectionDict::new("A", "a");
        dict.children.push(SectionDict::new("X", "x"));
        let a = h.add_child(h.root_id(), &dict, &registry).unwrap();
        let x = h.children(a)[0].id;
        (h, registry, a, x)
    }

    fn text(body: &str) -> BlockDict {
        serde_json::from_value(json!({ "block_type": TEXT_BLOCK, "body": body })).unwrap()
    }

    #[test]
    fn fresh_version_has_nothing_newer() {
        let (h, _, a, _) = tree();
        let mut store = VersionStore::new();
        let v = store.save_version(&h, a, 1, "created").unwrap().clone();
        assert!(store.more_recent_versions(&h, &v).is_empty());
        assert_eq!(v.snapshot().unwrap().children[0].slug, "x");
    }

    #[test]
    fn newer_version_of_same_section_counts() {
        let (h, _, a, _) = tree();
        let mut store = VersionStore::new();
        let v1 = store.save_version(&h, a, 1, "first").unwrap().clone();
        store.save_version(&h, a, 1, "second").unwrap();
        assert_eq!(store.more_recent_versions(&h, &v1).len(), 1);
    }

    #[test]
    fn newer_version_of_descendant_counts() {
        let (h, _, a, x) = tree();
        let mut store = VersionStore::new();
        let v1 = store.save_version(&h, a, 1, "parent").unwrap().clone();
        store.save_version(&h, x, 2, "child").unwrap();

        let newer = store.more_recent_versions(&h, &v1);
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].section_id, x);
    }

    #[test]
    fn ancestor_versions_do_not_count() {
        let (h, _, a, x) = tree();
        let mut store = VersionStore::new();
        let vx = store.save_version(&h, x, 1, "child").unwrap().clone();
        store.save_version(&h, a, 1, "parent").unwrap();
        assert!(store.more_recent_versions(&h, &vx).is_empty());
    }

    #[test]
    fn versions_listed_oldest_first() {
        let (h, _, a, x) = tree();
        let mut store = VersionStore::new();
        store.save_version(&h, a, 1, "one").unwrap();
        store.save_version(&h, x, 1, "other").unwrap();
        store.save_version(&h, a, 1, "two").unwrap();
        let activities: Vec<_> = store.versions_for(a).iter().map(|v| v.activity.as_str()).collect();
        assert_eq!(activities, vec!["one", "two"]);
    }

    #[test]
    fn revert_restores_subtree() {
        let (mut h, registry, a, x) = tree();
        let mut store = VersionStore::new();
        let v1 = store.save_version(&h, a, 1, "initial").unwrap().id;

        h.add_block(a, &text("added later"), &registry).unwrap();
        h.remove_section(x).unwrap();
        h.add_child(a, &SectionDict::new("Y", "y"), &registry).unwrap();

        let (saved, removed) = store.revert_to_version(&mut h, v1, 9, &registry).unwrap();
        assert_eq!(saved.activity, format!("Reverted to version {v1}"));
        assert_eq!(saved.user_id, 9);
        assert_eq!(removed.len(), 1);

        assert!(h.blocks_of(a).is_empty());
        let kids: Vec<_> = h.children(a).iter().map(|s| s.slug.clone()).collect();
        assert_eq!(kids, vec!["x"]);
        h.check_invariants().unwrap();
    }

    #[test]
    fn revert_unknown_version() {
        let (mut h, registry, _, _) = tree();
        let mut store = VersionStore::new();
        assert!(matches!(
            store.revert_to_version(&mut h, 5, 1, &registry),
            Err(CoreError::NotFound { entity: "version", .. })
        ));
    }
}
