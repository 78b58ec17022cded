//! Nested plain-data exchange format.
//!
//! Used for bulk import/export of whole hierarchies and as the payload of
//! version snapshots. A block's type-specific fields sit next to its common
//! fields, so a text block reads
//! `{"label": "", "css_extra": "", "block_type": "Text Block", "body": "..."}`.
//!
//! [`clean_section`] and [`clean_block`] validate a record against the
//! block-type registry and return the normalised copy that gets stored.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::block_type::{BlockContext, BlockTypeRegistry};
use crate::error::{CoreError, FieldErrors};
use crate::slug::validate_slug;
use crate::types::Payload;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct HierarchyDict {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub sections: Vec<SectionDict>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SectionDict {
    #[validate(length(min = 1, max = 256, message = "Label must be 1-256 characters"))]
    pub label: String,
    pub slug: String,
    /// Module boundary flag. When absent, top-level sections are modules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_module: Option<bool>,
    #[serde(default)]
    pub pageblocks: Vec<BlockDict>,
    #[serde(default)]
    pub children: Vec<SectionDict>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BlockDict {
    #[serde(default)]
    #[validate(length(max = 256, message = "Label must be at most 256 characters"))]
    pub label: String,
    #[serde(default)]
    #[validate(length(max = 1024, message = "CSS extra must be at most 1024 characters"))]
    pub css_extra: String,
    pub block_type: String,
    #[serde(flatten)]
    pub payload: Payload,
}

impl SectionDict {
    /// A section record with no blocks and no children.
    pub fn new(label: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            slug: slug.into(),
            is_module: None,
            pageblocks: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Number of sections in this record, itself included.
    pub fn section_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(SectionDict::section_count)
            .sum::<usize>()
    }
}

/// Validate a block record and return it with its payload cleaned by the
/// block type. Failures are reported per field.
pub fn clean_block(dict: &BlockDict, registry: &BlockTypeRegistry) -> Result<BlockDict, CoreError> {
    let mut errors = match dict.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => FieldErrors::from(e),
    };

    let block_type = registry.require(&dict.block_type)?;
    let payload = match block_type.clean(&dict.payload, &BlockContext::default()) {
        Ok(payload) => payload,
        Err(e) => {
            errors.merge(e);
            Payload::new()
        }
    };
    errors.into_result()?;

    Ok(BlockDict {
        label: dict.label.clone(),
        css_extra: dict.css_extra.clone(),
        block_type: dict.block_type.clone(),
        payload,
    })
}

/// Validate a section record and everything below it.
///
/// Checks labels, slug format, slug uniqueness among each set of siblings
/// inside the record, and every block. `top_level` says whether the record
/// will become a direct child of a root; it decides the default module flag,
/// which is filled in on every returned section.
pub fn clean_section(
    dict: &SectionDict,
    registry: &BlockTypeRegistry,
    top_level: bool,
) -> Result<SectionDict, CoreError> {
    if let Err(e) = dict.validate() {
        return Err(CoreError::Validation(format!(
            "Section '{}': {}",
            dict.slug,
            FieldErrors::from(e)
        )));
    }
    validate_slug(&dict.slug)?;

    let mut cleaned = clean_contents(dict, registry, false)?;
    cleaned.is_module = Some(dict.is_module.unwrap_or(top_level));
    Ok(cleaned)
}

/// Validate only the blocks and children of a record, leaving its own
/// label, slug and module flag as given.
///
/// Root snapshots go through here: the root has no slug of its own.
/// `children_top_level` sets the default module flag of the children.
pub fn clean_contents(
    dict: &SectionDict,
    registry: &BlockTypeRegistry,
    children_top_level: bool,
) -> Result<SectionDict, CoreError> {
    let pageblocks = dict
        .pageblocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            clean_block(block, registry).map_err(|e| {
                CoreError::Validation(format!(
                    "Block {} of section '{}': {}",
                    i + 1,
                    dict.slug,
                    describe(&e)
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    for child in &dict.children {
        if !seen.insert(child.slug.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate slug '{}' among children of '{}'",
                child.slug, dict.slug
            )));
        }
    }

    let children = dict
        .children
        .iter()
        .map(|child| clean_section(child, registry, children_top_level))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SectionDict {
        label: dict.label.clone(),
        slug: dict.slug.clone(),
        is_module: dict.is_module,
        pageblocks,
        children,
    })
}

fn describe(err: &CoreError) -> String {
    match err {
        CoreError::InvalidFields(fields) => fields.to_string(),
        CoreError::Validation(msg) => msg.clone(),
        other => other.to_string(),
    }
}
