//! Structural mutations.
//!
//! Each operation validates its input against the current tree before
//! changing anything, so a failed call leaves the hierarchy as it was.

use super::Hierarchy;
use crate::block::ContentBlock;
use crate::block_type::{BlockContext, BlockTypeRegistry};
use crate::error::CoreError;
use crate::exchange::{clean_block, clean_contents, clean_section, BlockDict, SectionDict};
use crate::ordering::check_permutation;
use crate::section::{Section, SectionRecord, SectionUpdate};
use crate::types::{DbId, Payload};

impl Hierarchy {
    // -- Adding -------------------------------------------------------------

    /// Import `dict` and everything below it as the last child of `parent`.
    ///
    /// Returns the id of the new section.
    pub fn add_child(
        &mut self,
        parent: DbId,
        dict: &SectionDict,
        registry: &BlockTypeRegistry,
    ) -> Result<DbId, CoreError> {
        let top_level = self.require_section(parent)?.is_root();
        let cleaned = clean_section(dict, registry, top_level)?;
        self.ensure_slug_free(parent, &cleaned.slug, None)?;

        let id = self.insert_subtree(parent, &cleaned);
        tracing::info!(
            hierarchy_id = self.id,
            parent_id = parent,
            section_id = id,
            sections = cleaned.section_count(),
            "Section added"
        );
        Ok(id)
    }

    /// Append a block to the end of a section's block list.
    pub fn add_block(
        &mut self,
        section: DbId,
        dict: &BlockDict,
        registry: &BlockTypeRegistry,
    ) -> Result<DbId, CoreError> {
        self.require_section(section)?;
        let cleaned = clean_block(dict, registry)?;
        let id = self.insert_block(section, &cleaned);
        tracing::info!(hierarchy_id = self.id, section_id = section, block_id = id, "Block added");
        Ok(id)
    }

    /// Link an already cleaned record under `parent`.
    pub(crate) fn insert_subtree(&mut self, parent: DbId, dict: &SectionDict) -> DbId {
        let id = self.alloc_id();
        let ordinality = self
            .sections
            .get(&parent)
            .map_or(1, |p| p.children.len() as i32 + 1);

        let section = Section::from_record(
            self.id,
            SectionRecord {
                id,
                parent_id: Some(parent),
                label: dict.label.clone(),
                slug: dict.slug.clone(),
                ordinality,
                is_module: dict.is_module.unwrap_or(false),
            },
        );
        self.sections.insert(id, section);
        if let Some(p) = self.sections.get_mut(&parent) {
            p.children.push(id);
        }

        for block in &dict.pageblocks {
            self.insert_block(id, block);
        }
        for child in &dict.children {
            self.insert_subtree(id, child);
        }
        id
    }

    fn insert_block(&mut self, section: DbId, dict: &BlockDict) -> DbId {
        let id = self.alloc_id();
        let ordinality = self
            .sections
            .get(&section)
            .map_or(1, |s| s.blocks.len() as i32 + 1);

        self.blocks.insert(
            id,
            ContentBlock {
                id,
                section_id: section,
                ordinality,
                label: dict.label.clone(),
                css_extra: dict.css_extra.clone(),
                block_type: dict.block_type.clone(),
                payload: dict.payload.clone(),
            },
        );
        if let Some(s) = self.sections.get_mut(&section) {
            s.blocks.push(id);
        }
        id
    }

    // -- Editing ------------------------------------------------------------

    /// See [`ContentBlock::edit`].
    pub fn edit_block(
        &mut self,
        id: DbId,
        values: &Payload,
        registry: &BlockTypeRegistry,
        ctx: &BlockContext,
    ) -> Result<(), CoreError> {
        let block = self
            .blocks
            .get_mut(&id)
            .ok_or(CoreError::NotFound { entity: "block", id })?;
        block.edit(values, registry, ctx)?;
        tracing::info!(hierarchy_id = self.id, block_id = id, "Block edited");
        Ok(())
    }

    /// Change a section's label, slug or module flag.
    pub fn edit_section(&mut self, id: DbId, update: &SectionUpdate) -> Result<(), CoreError> {
        let section = self.require_section(id)?;
        update.check()?;

        if let Some(slug) = &update.slug {
            match section.parent_id {
                None => {
                    return Err(CoreError::Validation(
                        "The root section has no slug".into(),
                    ))
                }
                Some(parent) => self.ensure_slug_free(parent, slug, Some(id))?,
            }
        }

        let Some(section) = self.sections.get_mut(&id) else {
            return Err(CoreError::NotFound { entity: "section", id });
        };
        if let Some(label) = &update.label {
            section.label = label.clone();
        }
        if let Some(slug) = &update.slug {
            section.slug = slug.clone();
        }
        if let Some(is_module) = update.is_module {
            section.is_module = is_module;
        }
        tracing::info!(hierarchy_id = self.id, section_id = id, "Section edited");
        Ok(())
    }

    // -- Ordering -----------------------------------------------------------

    /// Put the children of `id` in the order given by `ids`.
    pub fn reorder_children(&mut self, id: DbId, ids: &[DbId]) -> Result<(), CoreError> {
        check_permutation(&self.require_section(id)?.children, ids, "children")?;
        if let Some(section) = self.sections.get_mut(&id) {
            section.children = ids.to_vec();
        }
        self.renumber_children(id);
        tracing::info!(hierarchy_id = self.id, section_id = id, "Children reordered");
        Ok(())
    }

    /// Put the blocks of `id` in the order given by `ids`.
    pub fn reorder_blocks(&mut self, id: DbId, ids: &[DbId]) -> Result<(), CoreError> {
        check_permutation(&self.require_section(id)?.blocks, ids, "blocks")?;
        if let Some(section) = self.sections.get_mut(&id) {
            section.blocks = ids.to_vec();
        }
        self.renumber_blocks(id);
        tracing::info!(hierarchy_id = self.id, section_id = id, "Blocks reordered");
        Ok(())
    }

    /// Re-parent a section as the last child of `new_parent`.
    pub fn move_section(&mut self, id: DbId, new_parent: DbId) -> Result<(), CoreError> {
        let section = self.require_section(id)?;
        let Some(old_parent) = section.parent_id else {
            tracing::warn!(hierarchy_id = self.id, "Rejected move of the root section");
            return Err(CoreError::Validation("The root section cannot be moved".into()));
        };
        let slug = section.slug.clone();
        self.require_section(new_parent)?;

        if new_parent == id || self.is_ancestor_of(id, new_parent) {
            tracing::warn!(
                hierarchy_id = self.id,
                section_id = id,
                new_parent,
                "Rejected move under own subtree"
            );
            return Err(CoreError::Validation(format!(
                "Section {id} cannot be moved under itself or its descendants"
            )));
        }
        self.ensure_slug_free(new_parent, &slug, Some(id))?;

        if let Some(p) = self.sections.get_mut(&old_parent) {
            p.children.retain(|c| *c != id);
        }
        self.renumber_children(old_parent);
        if let Some(p) = self.sections.get_mut(&new_parent) {
            p.children.push(id);
        }
        if let Some(s) = self.sections.get_mut(&id) {
            s.parent_id = Some(new_parent);
        }
        self.renumber_children(new_parent);

        tracing::info!(
            hierarchy_id = self.id,
            section_id = id,
            old_parent,
            new_parent,
            "Section moved"
        );
        Ok(())
    }

    // -- Removal ------------------------------------------------------------

    /// Delete a section with its subtree and blocks.
    ///
    /// Returns the ids of every removed section, the given one first.
    pub fn remove_section(&mut self, id: DbId) -> Result<Vec<DbId>, CoreError> {
        let Some(parent) = self.require_section(id)?.parent_id else {
            tracing::warn!(hierarchy_id = self.id, "Rejected delete of the root section");
            return Err(CoreError::Validation("The root section cannot be deleted".into()));
        };

        let removed = self.subtree_ids(id);
        self.drop_sections(&removed);
        if let Some(p) = self.sections.get_mut(&parent) {
            p.children.retain(|c| *c != id);
        }
        self.renumber_children(parent);

        tracing::info!(
            hierarchy_id = self.id,
            section_id = id,
            removed = removed.len(),
            "Section deleted"
        );
        Ok(removed)
    }

    /// Delete a block and close the gap it leaves.
    pub fn remove_block(&mut self, id: DbId) -> Result<(), CoreError> {
        let block = self
            .blocks
            .remove(&id)
            .ok_or(CoreError::NotFound { entity: "block", id })?;
        if let Some(s) = self.sections.get_mut(&block.section_id) {
            s.blocks.retain(|b| *b != id);
        }
        self.renumber_blocks(block.section_id);
        tracing::info!(hierarchy_id = self.id, block_id = id, section_id = block.section_id, "Block deleted");
        Ok(())
    }

    // -- Replacement --------------------------------------------------------

    /// Replace a section's fields, blocks and children with `dict`.
    ///
    /// The section keeps its id and position. On the root only the label,
    /// blocks and children are taken from `dict`. Returns the ids of the
    /// sections that were removed.
    pub fn replace_section(
        &mut self,
        id: DbId,
        dict: &SectionDict,
        registry: &BlockTypeRegistry,
    ) -> Result<Vec<DbId>, CoreError> {
        let section = self.require_section(id)?;
        let cleaned = match section.parent_id {
            None => clean_contents(dict, registry, true)?,
            Some(parent) => {
                let top_level = self.require_section(parent)?.is_root();
                let cleaned = clean_section(dict, registry, top_level)?;
                self.ensure_slug_free(parent, &cleaned.slug, Some(id))?;
                cleaned
            }
        };

        let old_children = section.children.clone();
        let old_blocks = section.blocks.clone();
        let mut removed = Vec::new();
        for child in old_children {
            removed.extend(self.subtree_ids(child));
        }
        self.drop_sections(&removed);
        for block in &old_blocks {
            self.blocks.remove(block);
        }

        if let Some(s) = self.sections.get_mut(&id) {
            s.children.clear();
            s.blocks.clear();
            s.label = cleaned.label.clone();
            if !s.is_root() {
                s.slug = cleaned.slug.clone();
                s.is_module = cleaned.is_module.unwrap_or(s.is_module);
            }
        }
        for block in &cleaned.pageblocks {
            self.insert_block(id, block);
        }
        for child in &cleaned.children {
            self.insert_subtree(id, child);
        }

        tracing::info!(
            hierarchy_id = self.id,
            section_id = id,
            removed = removed.len(),
            "Section replaced"
        );
        Ok(removed)
    }

    // -- Helpers ------------------------------------------------------------

    /// Fail with a conflict if a child of `parent` other than `except`
    /// already uses `slug`.
    pub fn ensure_slug_free(
        &self,
        parent: DbId,
        slug: &str,
        except: Option<DbId>,
    ) -> Result<(), CoreError> {
        let taken = self
            .children(parent)
            .iter()
            .any(|c| c.slug == slug && Some(c.id) != except);
        if taken {
            tracing::warn!(hierarchy_id = self.id, parent_id = parent, slug, "Duplicate sibling slug");
            return Err(CoreError::Conflict(format!(
                "A section with slug '{slug}' already exists here"
            )));
        }
        Ok(())
    }

    fn drop_sections(&mut self, ids: &[DbId]) {
        for id in ids {
            if let Some(section) = self.sections.remove(id) {
                for block in section.blocks {
                    self.blocks.remove(&block);
                }
            }
        }
    }

    fn renumber_children(&mut self, id: DbId) {
        let order = match self.sections.get(&id) {
            Some(s) => s.children.clone(),
            None => return,
        };
        for (i, child) in order.iter().enumerate() {
            if let Some(c) = self.sections.get_mut(child) {
                c.ordinality = i as i32 + 1;
            }
        }
    }

    fn renumber_blocks(&mut self, id: DbId) {
        let order = match self.sections.get(&id) {
            Some(s) => s.blocks.clone(),
            None => return,
        };
        for (i, block) in order.iter().enumerate() {
            if let Some(b) = self.blocks.get_mut(block) {
                b.ordinality = i as i32 + 1;
            }
        }
    }
}
