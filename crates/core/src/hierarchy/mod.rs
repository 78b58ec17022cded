//! Hierarchy: one complete section tree.
//!
//! Sections and blocks live in id-keyed arenas owned by the [`Hierarchy`].
//! Each section stores its parent id and the ordered ids of its children and
//! blocks, so walking up or down the tree is a map lookup per step.
//!
//! The operations are split across submodules:
//! - `navigation`: paths, path resolution and document-order traversal
//! - `mutation`: adding, editing, moving, reordering and removing nodes
//! - `serialize`: conversion to and from the nested exchange format

mod mutation;
mod navigation;
mod serialize;

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::block::ContentBlock;
use crate::error::CoreError;
use crate::ordering::is_contiguous;
use crate::section::{Section, SectionRecord};
use crate::types::DbId;

pub use navigation::TRAILING_MARKERS;

/// Label given to the root section of a new hierarchy.
pub const ROOT_LABEL: &str = "Root";

/// One content tree, addressed by its unique name.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    id: DbId,
    name: String,
    base_url: String,
    root: DbId,
    sections: HashMap<DbId, Section>,
    blocks: HashMap<DbId, ContentBlock>,
    next_id: DbId,
}

impl Hierarchy {
    /// Create an empty hierarchy holding only its root section.
    pub fn new(id: DbId, name: impl Into<String>, base_url: impl Into<String>) -> Self {
        let root_id = 1;
        let root = Section::from_record(
            id,
            SectionRecord {
                id: root_id,
                parent_id: None,
                label: ROOT_LABEL.to_string(),
                slug: String::new(),
                ordinality: 1,
                is_module: false,
            },
        );

        Self {
            id,
            name: name.into(),
            base_url: base_url.into(),
            root: root_id,
            sections: HashMap::from([(root_id, root)]),
            blocks: HashMap::new(),
            next_id: root_id + 1,
        }
    }

    /// Link stored section and block rows into a tree.
    ///
    /// Children and blocks are ordered by their stored ordinality. Fails with
    /// [`CoreError::Internal`] if the rows do not form one valid tree.
    pub fn assemble(
        id: DbId,
        name: impl Into<String>,
        base_url: impl Into<String>,
        sections: Vec<SectionRecord>,
        blocks: Vec<ContentBlock>,
    ) -> Result<Self, CoreError> {
        let mut arena: HashMap<DbId, Section> = HashMap::with_capacity(sections.len());
        let mut root = None;

        for record in sections {
            if record.parent_id.is_none() && root.replace(record.id).is_some() {
                return Err(CoreError::Internal(format!(
                    "Hierarchy {id} has more than one root section"
                )));
            }
            arena.insert(record.id, Section::from_record(id, record));
        }
        let root = root.ok_or_else(|| {
            CoreError::Internal(format!("Hierarchy {id} has no root section"))
        })?;

        let mut links: Vec<(DbId, i32, DbId)> = arena
            .values()
            .filter_map(|s| s.parent_id.map(|p| (p, s.ordinality, s.id)))
            .collect();
        links.sort_unstable();
        for (parent, _, child) in links {
            arena
                .get_mut(&parent)
                .ok_or_else(|| {
                    CoreError::Internal(format!(
                        "Section {child} refers to missing parent {parent}"
                    ))
                })?
                .children
                .push(child);
        }

        let mut block_links: Vec<(DbId, i32, DbId)> = blocks
            .iter()
            .map(|b| (b.section_id, b.ordinality, b.id))
            .collect();
        block_links.sort_unstable();
        for (section, _, block) in block_links {
            arena
                .get_mut(&section)
                .ok_or_else(|| {
                    CoreError::Internal(format!(
                        "Block {block} refers to missing section {section}"
                    ))
                })?
                .blocks
                .push(block);
        }

        let next_id = arena
            .keys()
            .chain(blocks.iter().map(|b| &b.id))
            .max()
            .copied()
            .unwrap_or(0)
            + 1;

        let hierarchy = Self {
            id,
            name: name.into(),
            base_url: base_url.into(),
            root,
            sections: arena,
            blocks: blocks.into_iter().map(|b| (b.id, b)).collect(),
            next_id,
        };
        hierarchy.check_invariants()?;
        Ok(hierarchy)
    }

    // -- Identity -----------------------------------------------------------

    pub fn id(&self) -> DbId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prefix of every externally visible section URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- Lookup -------------------------------------------------------------

    pub fn root(&self) -> &Section {
        &self.sections[&self.root]
    }

    pub fn root_id(&self) -> DbId {
        self.root
    }

    pub fn section(&self, id: DbId) -> Option<&Section> {
        self.sections.get(&id)
    }

    pub fn block(&self, id: DbId) -> Option<&ContentBlock> {
        self.blocks.get(&id)
    }

    pub fn contains_section(&self, id: DbId) -> bool {
        self.sections.contains_key(&id)
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Children of `id` in order. Empty for unknown ids.
    pub fn children(&self, id: DbId) -> Vec<&Section> {
        self.section(id)
            .map(|s| s.children.iter().filter_map(|c| self.sections.get(c)).collect())
            .unwrap_or_default()
    }

    /// The root's direct children.
    pub fn top_level(&self) -> Vec<&Section> {
        self.children(self.root)
    }

    /// Blocks of `id` in order. Empty for unknown ids.
    pub fn blocks_of(&self, id: DbId) -> Vec<&ContentBlock> {
        self.section(id)
            .map(|s| s.blocks.iter().filter_map(|b| self.blocks.get(b)).collect())
            .unwrap_or_default()
    }

    /// Display title of a block, see [`ContentBlock::title`].
    pub fn block_title(&self, id: DbId) -> Option<String> {
        let block = self.block(id)?;
        let section = self.section(block.section_id)?;
        Some(block.title(&section.label))
    }

    pub(crate) fn require_section(&self, id: DbId) -> Result<&Section, CoreError> {
        self.sections.get(&id).ok_or(CoreError::NotFound {
            entity: "section",
            id,
        })
    }

    // -- Invariants ---------------------------------------------------------

    /// Verify the structural invariants of the whole tree.
    ///
    /// Every section is reachable from the root, parent links agree with
    /// child lists, sibling slugs are unique, and sibling ordinalities of both
    /// sections and blocks are exactly `1..=N` in list order.
    pub fn check_invariants(&self) -> Result<(), CoreError> {
        let broken = |msg: String| Err(CoreError::Internal(msg));

        let mut reached = 0usize;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            reached += 1;
            let Some(section) = self.sections.get(&id) else {
                return broken(format!("Section {id} is listed but missing"));
            };

            let mut slugs = HashSet::new();
            let mut ordinalities = Vec::with_capacity(section.children.len());
            for child_id in &section.children {
                let Some(child) = self.sections.get(child_id) else {
                    return broken(format!("Child {child_id} of section {id} is missing"));
                };
                if child.parent_id != Some(id) {
                    return broken(format!("Section {child_id} is listed under {id} but points elsewhere"));
                }
                if !slugs.insert(child.slug.as_str()) {
                    return broken(format!("Duplicate slug '{}' under section {id}", child.slug));
                }
                ordinalities.push(child.ordinality);
                stack.push(*child_id);
            }
            if !is_contiguous(ordinalities) {
                return broken(format!("Children of section {id} are not numbered 1..N"));
            }

            let mut block_ordinalities = Vec::with_capacity(section.blocks.len());
            for block_id in &section.blocks {
                let Some(block) = self.blocks.get(block_id) else {
                    return broken(format!("Block {block_id} of section {id} is missing"));
                };
                if block.section_id != id {
                    return broken(format!("Block {block_id} is listed under {id} but points elsewhere"));
                }
                block_ordinalities.push(block.ordinality);
            }
            if !is_contiguous(block_ordinalities) {
                return broken(format!("Blocks of section {id} are not numbered 1..N"));
            }
        }

        if reached != self.sections.len() {
            return broken(format!(
                "{} of {} sections are reachable from the root",
                reached,
                self.sections.len()
            ));
        }
        Ok(())
    }

    fn alloc_id(&mut self) -> DbId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
