//! Section nodes of a hierarchy tree.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{CoreError, FieldErrors};
use crate::slug::validate_slug;
use crate::types::DbId;

/// One node of a [`Hierarchy`](crate::hierarchy::Hierarchy).
///
/// Nodes live in the hierarchy's arena. A node refers to its parent by id and
/// owns the ordered id lists of its children and its blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub id: DbId,
    pub hierarchy_id: DbId,
    /// `None` only for the root.
    pub parent_id: Option<DbId>,
    pub label: String,
    pub slug: String,
    /// 1-based position among siblings. The root is always 1.
    pub ordinality: i32,
    /// Marks the section as a module boundary for navigation grouping.
    pub is_module: bool,
    #[serde(skip)]
    pub(crate) children: Vec<DbId>,
    #[serde(skip)]
    pub(crate) blocks: Vec<DbId>,
}

/// A section row as stored, before it is linked into a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRecord {
    pub id: DbId,
    pub parent_id: Option<DbId>,
    pub label: String,
    pub slug: String,
    pub ordinality: i32,
    pub is_module: bool,
}

/// Edit of a section's own fields. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SectionUpdate {
    #[validate(length(min = 1, max = 256, message = "Label must be 1-256 characters"))]
    pub label: Option<String>,
    pub slug: Option<String>,
    pub is_module: Option<bool>,
}

impl SectionUpdate {
    /// Field-level checks that need no knowledge of the tree.
    pub fn check(&self) -> Result<(), CoreError> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };
        if let Some(slug) = &self.slug {
            if let Err(CoreError::Validation(msg)) = validate_slug(slug) {
                errors.add("slug", msg);
            }
        }
        errors.into_result()
    }
}

impl Section {
    pub(crate) fn from_record(hierarchy_id: DbId, record: SectionRecord) -> Self {
        Self {
            id: record.id,
            hierarchy_id,
            parent_id: record.parent_id,
            label: record.label,
            slug: record.slug,
            ordinality: record.ordinality,
            is_module: record.is_module,
            children: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Child section ids in order.
    pub fn children(&self) -> &[DbId] {
        &self.children
    }

    /// Block ids in order.
    pub fn blocks(&self) -> &[DbId] {
        &self.blocks
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}
