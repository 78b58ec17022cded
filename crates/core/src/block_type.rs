//! Pluggable block-type behaviour.
//!
//! Every content block names its type with a `block_type` string. The
//! [`BlockTypeRegistry`] maps that string to a [`BlockType`] implementation
//! which knows the type's field schema, how to clean submitted values, and
//! how to render the stored payload. Registries are plain values: the server
//! owns one in its state, tests build their own.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::block::ContentBlock;
use crate::error::{CoreError, FieldErrors};
use crate::types::{Payload, UserId};

// ---------------------------------------------------------------------------
// Field schema
// ---------------------------------------------------------------------------

/// Registry key and display name of the built-in text block.
pub const TEXT_BLOCK: &str = "Text Block";

/// Maximum body length accepted by [`TextBlock`].
pub const MAX_BODY_LEN: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    Boolean,
}

/// Description of one editable field, used by callers to build edit forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// Fields every block carries regardless of its type.
pub const DEFAULT_BLOCK_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "label",
        label: "Label",
        kind: FieldKind::Text,
        required: false,
    },
    FieldSpec {
        name: "css_extra",
        label: "CSS extra",
        kind: FieldKind::Text,
        required: false,
    },
];

/// Fields of the add/edit section form.
pub const SECTION_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "label",
        label: "Label",
        kind: FieldKind::Text,
        required: true,
    },
    FieldSpec {
        name: "slug",
        label: "Slug",
        kind: FieldKind::Text,
        required: true,
    },
];

/// Caller context handed to rendering and editing hooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockContext {
    pub user_id: Option<UserId>,
}

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// Behaviour attached to one `block_type`.
pub trait BlockType: Send + Sync {
    /// Human-readable name, also shown as the block's edit label.
    fn display_name(&self) -> &str;

    /// Type-specific payload fields.
    fn fields(&self) -> &'static [FieldSpec];

    /// Validate submitted values and return the payload to store.
    ///
    /// Values for fields outside [`BlockType::fields`] are dropped.
    fn clean(&self, values: &Payload, _ctx: &BlockContext) -> Result<Payload, FieldErrors> {
        clean_with_schema(self.fields(), values)
    }

    fn render(&self, block: &ContentBlock, ctx: &BlockContext) -> String;

    fn render_summary(&self, block: &ContentBlock, ctx: &BlockContext) -> String {
        self.render(block, ctx)
    }

    fn render_js(&self, _block: &ContentBlock) -> String {
        String::new()
    }

    fn render_css(&self, _block: &ContentBlock) -> String {
        String::new()
    }
}

/// Check `values` against a field schema.
///
/// Required fields must be present; text fields must be strings and boolean
/// fields booleans. Returns only the fields named in the schema.
pub fn clean_with_schema(fields: &[FieldSpec], values: &Payload) -> Result<Payload, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut cleaned = Payload::new();

    for field in fields {
        match values.get(field.name) {
            None | Some(serde_json::Value::Null) => {
                if field.required {
                    errors.add(field.name, "This field is required");
                }
            }
            Some(value) => {
                let ok = match field.kind {
                    FieldKind::Text | FieldKind::TextArea => value.is_string(),
                    FieldKind::Boolean => value.is_boolean(),
                };
                if ok {
                    cleaned.insert(field.name.to_string(), value.clone());
                } else {
                    errors.add(field.name, format!("Expected a {:?} value", field.kind));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(cleaned)
    } else {
        Err(errors)
    }
}

// ---------------------------------------------------------------------------
// Text block
// ---------------------------------------------------------------------------

const TEXT_BLOCK_FIELDS: &[FieldSpec] = &[FieldSpec {
    name: "body",
    label: "Body",
    kind: FieldKind::TextArea,
    required: true,
}];

/// Plain text block: a `body` rendered as one paragraph.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextBlock;

impl BlockType for TextBlock {
    fn display_name(&self) -> &str {
        TEXT_BLOCK
    }

    fn fields(&self) -> &'static [FieldSpec] {
        TEXT_BLOCK_FIELDS
    }

    fn clean(&self, values: &Payload, _ctx: &BlockContext) -> Result<Payload, FieldErrors> {
        let cleaned = clean_with_schema(self.fields(), values)?;
        let too_long = cleaned
            .get("body")
            .and_then(|v| v.as_str())
            .is_some_and(|body| body.len() > MAX_BODY_LEN);
        if too_long {
            let mut errors = FieldErrors::new();
            errors.add("body", format!("Body must be at most {MAX_BODY_LEN} characters"));
            return Err(errors);
        }
        Ok(cleaned)
    }

    fn render(&self, block: &ContentBlock, _ctx: &BlockContext) -> String {
        format!("<p>{}</p>", escape_html(block.text("body").unwrap_or_default()))
    }

    fn render_summary(&self, block: &ContentBlock, _ctx: &BlockContext) -> String {
        block.text("body").unwrap_or_default().to_string()
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Lookup from `block_type` name to its behaviour.
#[derive(Clone, Default)]
pub struct BlockTypeRegistry {
    types: BTreeMap<String, Arc<dyn BlockType>>,
}

impl fmt::Debug for BlockTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.types.keys()).finish()
    }
}

impl BlockTypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in [`TextBlock`] registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .types
            .insert(TEXT_BLOCK.to_string(), Arc::new(TextBlock));
        registry
    }

    /// Register a block type. Fails if the name is already taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        block_type: Arc<dyn BlockType>,
    ) -> Result<(), CoreError> {
        let name = name.into();
        if self.types.contains_key(&name) {
            return Err(CoreError::Conflict(format!(
                "Block type '{name}' is already registered"
            )));
        }
        self.types.insert(name, block_type);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn BlockType> {
        self.types.get(name).map(|t| t.as_ref())
    }

    /// Like [`BlockTypeRegistry::get`] but reports unknown names as a validation error.
    pub fn require(&self, name: &str) -> Result<&dyn BlockType, CoreError> {
        self.get(name).ok_or_else(|| {
            CoreError::Validation(format!(
                "Unknown block type '{name}'. Registered types: {}",
                self.names().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}
