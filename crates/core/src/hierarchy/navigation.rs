//! Path addressing and document-order traversal.

use super::Hierarchy;
use crate::section::Section;
use crate::types::DbId;

/// Final path segments that address a view of a section rather than a child.
pub const TRAILING_MARKERS: &[&str] = &["edit"];

impl Hierarchy {
    // -- Paths --------------------------------------------------------------

    /// Slugs from the top-level section down to `id`, each followed by `/`.
    ///
    /// The root's path is empty. Unknown ids have no path.
    pub fn path(&self, id: DbId) -> Option<String> {
        let section = self.section(id)?;
        let mut path = String::new();
        for ancestor in self.ancestors(id).into_iter().skip(1) {
            path.push_str(&ancestor.slug);
            path.push('/');
        }
        if !section.is_root() {
            path.push_str(&section.slug);
            path.push('/');
        }
        Some(path)
    }

    /// `base_url` followed by the section's path.
    pub fn absolute_url(&self, id: DbId) -> Option<String> {
        self.path(id).map(|path| format!("{}{}", self.base_url, path))
    }

    /// Resolve a slash-separated path to a section.
    ///
    /// Empty segments are ignored, so leading and trailing slashes make no
    /// difference and an empty path is the root. Leading segments matching
    /// `base_url` are stripped. A path ending in one of [`TRAILING_MARKERS`]
    /// that does not resolve as given is retried without the marker.
    pub fn find_section_from_path(&self, path: &str) -> Option<&Section> {
        let mut segments = split_segments(path);
        let base = split_segments(&self.base_url);
        if !base.is_empty() && segments.starts_with(&base) {
            segments.drain(..base.len());
        }

        if let Some(found) = self.walk(&segments) {
            return Some(found);
        }
        match segments.split_last() {
            Some((last, rest)) if TRAILING_MARKERS.contains(last) => {
                tracing::debug!(path, marker = *last, "Retrying path without trailing marker");
                self.walk(rest)
            }
            _ => None,
        }
    }

    fn walk(&self, segments: &[&str]) -> Option<&Section> {
        let mut current = self.root();
        for segment in segments {
            current = current
                .children
                .iter()
                .filter_map(|id| self.section(*id))
                .find(|child| child.slug == *segment)?;
        }
        Some(current)
    }

    // -- Leaves and document order ------------------------------------------

    /// Follow first children down to a childless section.
    pub fn first_leaf(&self, id: DbId) -> Option<&Section> {
        let mut current = self.section(id)?;
        while let Some(first) = current.children.first() {
            current = self.section(*first)?;
        }
        Some(current)
    }

    /// Follow last children down to a childless section.
    pub fn last_leaf(&self, id: DbId) -> Option<&Section> {
        let mut current = self.section(id)?;
        while let Some(last) = current.children.last() {
            current = self.section(*last)?;
        }
        Some(current)
    }

    /// Pre-order successor. The root is outside the reading order.
    pub fn next(&self, id: DbId) -> Option<&Section> {
        let section = self.section(id)?;
        if section.is_root() {
            return None;
        }
        if let Some(first) = section.children.first() {
            return self.section(*first);
        }

        let mut current = section;
        while let Some(parent_id) = current.parent_id {
            if let Some(sibling) = self.sibling_at(current, 1) {
                return Some(sibling);
            }
            current = self.section(parent_id)?;
        }
        None
    }

    /// Pre-order predecessor. Nothing precedes the first top-level section.
    pub fn previous(&self, id: DbId) -> Option<&Section> {
        let section = self.section(id)?;
        let parent = self.section(section.parent_id?)?;

        if let Some(sibling) = self.sibling_at(section, -1) {
            return self.last_leaf(sibling.id);
        }
        if parent.is_root() {
            None
        } else {
            Some(parent)
        }
    }

    /// The sibling `offset` places away from `section`, if any.
    fn sibling_at(&self, section: &Section, offset: isize) -> Option<&Section> {
        let parent = self.section(section.parent_id?)?;
        let index = parent.children.iter().position(|c| *c == section.id)?;
        let target = index.checked_add_signed(offset)?;
        parent.children.get(target).and_then(|c| self.section(*c))
    }

    // -- Position -----------------------------------------------------------

    /// The root counts as a first child.
    pub fn is_first_child(&self, id: DbId) -> bool {
        self.section(id).is_some_and(|s| s.ordinality == 1)
    }

    /// The root counts as a last child.
    pub fn is_last_child(&self, id: DbId) -> bool {
        let Some(section) = self.section(id) else {
            return false;
        };
        match section.parent_id.and_then(|p| self.section(p)) {
            Some(parent) => section.ordinality as usize == parent.children.len(),
            None => true,
        }
    }

    /// Nearest section flagged as a module, starting with `id` itself.
    pub fn module_of(&self, id: DbId) -> Option<&Section> {
        let mut current = self.section(id);
        while let Some(section) = current {
            if section.is_module {
                return Some(section);
            }
            current = section.parent_id.and_then(|p| self.section(p));
        }
        None
    }

    // -- Ancestry -----------------------------------------------------------

    /// Ancestors of `id`, root first, not including `id`.
    pub fn ancestors(&self, id: DbId) -> Vec<&Section> {
        let mut chain = Vec::new();
        let mut parent = self.section(id).and_then(|s| s.parent_id);
        while let Some(parent_id) = parent {
            let Some(section) = self.section(parent_id) else {
                break;
            };
            chain.push(section);
            parent = section.parent_id;
        }
        chain.reverse();
        chain
    }

    /// Every section below `id` in pre-order, not including `id`.
    pub fn descendants(&self, id: DbId) -> Vec<&Section> {
        let mut out = Vec::new();
        let Some(section) = self.section(id) else {
            return out;
        };
        let mut stack: Vec<DbId> = section.children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if let Some(s) = self.section(next) {
                out.push(s);
                stack.extend(s.children.iter().rev().copied());
            }
        }
        out
    }

    /// `id` followed by the ids of all its descendants.
    pub fn subtree_ids(&self, id: DbId) -> Vec<DbId> {
        if !self.contains_section(id) {
            return Vec::new();
        }
        std::iter::once(id)
            .chain(self.descendants(id).into_iter().map(|s| s.id))
            .collect()
    }

    /// Number of edges between the root and `id`. The root is at depth 0.
    pub fn depth(&self, id: DbId) -> Option<usize> {
        self.section(id).map(|_| self.ancestors(id).len())
    }

    /// True if `ancestor` lies strictly above `id`.
    pub fn is_ancestor_of(&self, ancestor: DbId, id: DbId) -> bool {
        self.ancestors(id).iter().any(|s| s.id == ancestor)
    }
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_type::BlockTypeRegistry;
    use crate::exchange::SectionDict;

    /// root
    /// ├── a
    /// │   ├── a1
    /// │   └── a2
    /// │       └── a2x
    /// └── b
    fn tree() -> (Hierarchy, [DbId; 5]) {
        let registry = BlockTypeRegistry::with_defaults();
        let mut h = Hierarchy::new(1, "main", "/learn/");
        let mut a = SectionDict::new("A", "a");
        let mut a2 = SectionDict::new("A2", "a2");
        a2.children.push(SectionDict::new("A2X", "a2x"));
        a.children.push(SectionDict::new("A1", "a1"));
        a.children.push(a2);

        let root = h.root_id();
        let a = h.add_child(root, &a, &registry).unwrap();
        let b = h.add_child(root, &SectionDict::new("B", "b"), &registry).unwrap();
        let a1 = h.children(a)[0].id;
        let a2 = h.children(a)[1].id;
        let a2x = h.children(a2)[0].id;
        (h, [a, a1, a2, a2x, b])
    }

    #[test]
    fn paths() {
        let (h, [a, _, a2, a2x, _]) = tree();
        assert_eq!(h.path(h.root_id()).as_deref(), Some(""));
        assert_eq!(h.path(a).as_deref(), Some("a/"));
        assert_eq!(h.path(a2x).as_deref(), Some("a/a2/a2x/"));
        assert_eq!(h.absolute_url(a2).as_deref(), Some("/learn/a/a2/"));
        assert_eq!(h.absolute_url(h.root_id()).as_deref(), Some("/learn/"));
        assert_eq!(h.path(999), None);
    }

    #[test]
    fn resolve_paths() {
        let (h, [a, _, a2, a2x, _]) = tree();
        assert_eq!(h.find_section_from_path("a").map(|s| s.id), Some(a));
        assert_eq!(h.find_section_from_path("a/").map(|s| s.id), Some(a));
        assert_eq!(h.find_section_from_path("/a/a2/").map(|s| s.id), Some(a2));
        assert_eq!(h.find_section_from_path("/learn/a/a2/a2x/").map(|s| s.id), Some(a2x));
        assert_eq!(h.find_section_from_path("/learn/").map(|s| s.id), Some(h.root_id()));
        assert_eq!(h.find_section_from_path("/").map(|s| s.id), Some(h.root_id()));
        assert_eq!(h.find_section_from_path("").map(|s| s.id), Some(h.root_id()));
        assert!(h.find_section_from_path("a/missing/").is_none());
    }

    #[test]
    fn base_url_stripped_without_leading_slash() {
        let (h, [a, _, a2, _, _]) = tree();
        assert_eq!(h.find_section_from_path("learn/a/").map(|s| s.id), Some(a));
        assert_eq!(h.find_section_from_path("learn/a/a2").map(|s| s.id), Some(a2));
        assert_eq!(h.find_section_from_path("learn").map(|s| s.id), Some(h.root_id()));
        assert_eq!(h.find_section_from_path("//learn//a/").map(|s| s.id), Some(a));
    }

    #[test]
    fn resolve_strips_edit_marker() {
        let (h, [_, _, a2, _, _]) = tree();
        assert_eq!(h.find_section_from_path("a/a2/edit/").map(|s| s.id), Some(a2));
        assert_eq!(h.find_section_from_path("edit").map(|s| s.id), Some(h.root_id()));
        assert!(h.find_section_from_path("a/nope/edit/").is_none());
    }

    #[test]
    fn section_slugged_like_marker_wins() {
        let registry = BlockTypeRegistry::with_defaults();
        let mut h = Hierarchy::new(1, "main", "");
        let root = h.root_id();
        let edit = h.add_child(root, &SectionDict::new("Edit", "edit"), &registry).unwrap();
        assert_eq!(h.find_section_from_path("edit/").map(|s| s.id), Some(edit));
    }

    #[test]
    fn leaves() {
        let (h, [a, a1, a2, a2x, b]) = tree();
        assert_eq!(h.first_leaf(h.root_id()).map(|s| s.id), Some(a1));
        assert_eq!(h.last_leaf(h.root_id()).map(|s| s.id), Some(b));
        assert_eq!(h.last_leaf(a).map(|s| s.id), Some(a2x));
        assert_eq!(h.first_leaf(a2).map(|s| s.id), Some(a2x));
        assert_eq!(h.first_leaf(b).map(|s| s.id), Some(b));
    }

    #[test]
    fn document_order() {
        let (h, ids) = tree();
        let [a, a1, a2, a2x, b] = ids;
        let order = [a, a1, a2, a2x, b];
        for pair in order.windows(2) {
            assert_eq!(h.next(pair[0]).map(|s| s.id), Some(pair[1]));
            assert_eq!(h.previous(pair[1]).map(|s| s.id), Some(pair[0]));
        }
        assert!(h.previous(a).is_none());
        assert!(h.next(b).is_none());
        assert!(h.next(h.root_id()).is_none());
        assert!(h.previous(h.root_id()).is_none());
    }

    #[test]
    fn positions() {
        let (h, [a, a1, a2, _, b]) = tree();
        assert!(h.is_first_child(a));
        assert!(h.is_last_child(b));
        assert!(!h.is_last_child(a));
        assert!(h.is_first_child(a1) && !h.is_last_child(a1));
        assert!(h.is_last_child(a2));
        assert!(h.is_first_child(h.root_id()) && h.is_last_child(h.root_id()));
    }

    #[test]
    fn modules() {
        let (h, [a, _, _, a2x, b]) = tree();
        assert!(h.module_of(h.root_id()).is_none());
        assert_eq!(h.module_of(a2x).map(|s| s.id), Some(a));
        assert_eq!(h.module_of(b).map(|s| s.id), Some(b));
    }

    #[test]
    fn ancestry() {
        let (h, [a, a1, a2, a2x, b]) = tree();
        let chain: Vec<_> = h.ancestors(a2x).iter().map(|s| s.id).collect();
        assert_eq!(chain, vec![h.root_id(), a, a2]);

        let below: Vec<_> = h.descendants(h.root_id()).iter().map(|s| s.id).collect();
        assert_eq!(below, vec![a, a1, a2, a2x, b]);
        assert_eq!(h.subtree_ids(a2), vec![a2, a2x]);

        assert_eq!(h.depth(h.root_id()), Some(0));
        assert_eq!(h.depth(a2x), Some(3));
        assert!(h.is_ancestor_of(a, a2x));
        assert!(!h.is_ancestor_of(a2x, a));
        assert!(!h.is_ancestor_of(a, a));
    }
}
