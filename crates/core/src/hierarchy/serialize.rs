use validator::Validate;

use super::Hierarchy;
use crate::block_type::BlockTypeRegistry;
use crate::error::{CoreError, FieldErrors};
use crate::exchange::{HierarchyDict, SectionDict};
use crate::types::DbId;

impl Hierarchy {
    /// Build a new hierarchy from the exchange format.
    ///
    /// The whole record is validated before anything is built; top-level
    /// sections must have unique slugs.
    pub fn from_nested_dict(
        id: DbId,
        dict: &HierarchyDict,
        registry: &BlockTypeRegistry,
    ) -> Result<Self, CoreError> {
        dict.validate()
            .map_err(|e| CoreError::Validation(format!("Hierarchy: {}", FieldErrors::from(e))))?;

        let mut hierarchy = Self::new(id, dict.name.clone(), dict.base_url.clone());
        let root = hierarchy.root().clone();
        let wrapper = SectionDict {
            label: root.label,
            slug: root.slug,
            is_module: Some(false),
            pageblocks: Vec::new(),
            children: dict.sections.clone(),
        };
        hierarchy.replace_section(hierarchy.root_id(), &wrapper, registry)?;
        Ok(hierarchy)
    }

    /// Export the whole tree in the exchange format.
    pub fn as_nested_dict(&self) -> HierarchyDict {
        HierarchyDict {
            name: self.name.clone(),
            base_url: self.base_url.clone(),
            sections: self
                .top_level()
                .iter()
                .filter_map(|s| self.section_as_dict(s.id).ok())
                .collect(),
        }
    }

    /// Export one section and its subtree. The module flag is always present.
    pub fn section_as_dict(&self, id: DbId) -> Result<SectionDict, CoreError> {
        let section = self.require_section(id)?;
        Ok(SectionDict {
            label: section.label.clone(),
            slug: section.slug.clone(),
            is_module: Some(section.is_module),
            pageblocks: self.blocks_of(id).iter().map(|b| b.to_dict()).collect(),
            children: section
                .children
                .iter()
                .map(|c| self.section_as_dict(*c))
                .collect::<Result<_, _>>()?,
        })
    }
}
