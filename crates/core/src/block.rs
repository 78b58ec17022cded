//! Content blocks: the ordered, typed units of content inside a section.

use serde::Serialize;
use validator::Validate;

use crate::block_type::{BlockContext, BlockTypeRegistry};
use crate::error::{CoreError, FieldErrors};
use crate::exchange::BlockDict;
use crate::types::{DbId, Payload};

/// One content block attached to a section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentBlock {
    pub id: DbId,
    pub section_id: DbId,
    /// 1-based position among the blocks of its section.
    pub ordinality: i32,
    pub label: String,
    pub css_extra: String,
    pub block_type: String,
    pub payload: Payload,
}

/// The common fields of an edit, checked before anything is applied.
#[derive(Debug, Validate)]
struct CommonFields {
    #[validate(length(max = 256, message = "Label must be at most 256 characters"))]
    label: String,
    #[validate(length(max = 1024, message = "CSS extra must be at most 1024 characters"))]
    css_extra: String,
}

impl ContentBlock {
    /// String value of a payload field, if present.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(|v| v.as_str())
    }

    /// Display title: `"{section label} [{ordinality}]: {block label}"`.
    pub fn title(&self, section_label: &str) -> String {
        format!("{} [{}]: {}", section_label, self.ordinality, self.label)
    }

    /// Serialize to the exchange format.
    pub fn to_dict(&self) -> BlockDict {
        BlockDict {
            label: self.label.clone(),
            css_extra: self.css_extra.clone(),
            block_type: self.block_type.clone(),
            payload: self.payload.clone(),
        }
    }

    pub fn render(&self, registry: &BlockTypeRegistry, ctx: &BlockContext) -> Result<String, CoreError> {
        Ok(registry.require(&self.block_type)?.render(self, ctx))
    }

    pub fn render_summary(
        &self,
        registry: &BlockTypeRegistry,
        ctx: &BlockContext,
    ) -> Result<String, CoreError> {
        Ok(registry.require(&self.block_type)?.render_summary(self, ctx))
    }

    pub fn render_js(&self, registry: &BlockTypeRegistry) -> Result<String, CoreError> {
        Ok(registry.require(&self.block_type)?.render_js(self))
    }

    pub fn render_css(&self, registry: &BlockTypeRegistry) -> Result<String, CoreError> {
        Ok(registry.require(&self.block_type)?.render_css(self))
    }

    /// Display name of the block's type, e.g. `"Text Block"`.
    pub fn edit_label(&self, registry: &BlockTypeRegistry) -> Result<String, CoreError> {
        Ok(registry.require(&self.block_type)?.display_name().to_string())
    }

    /// Apply an edit submitted as one flat map of values.
    ///
    /// `label` and `css_extra` are optional and keep their current value when
    /// absent. Every remaining value is handed to the block type, whose
    /// required fields must be present. Nothing is changed unless the whole
    /// submission is valid.
    pub fn edit(
        &mut self,
        values: &Payload,
        registry: &BlockTypeRegistry,
        ctx: &BlockContext,
    ) -> Result<(), CoreError> {
        let block_type = registry.require(&self.block_type)?;
        let mut errors = FieldErrors::new();

        let label = string_field(values, "label", &self.label, &mut errors);
        let css_extra = string_field(values, "css_extra", &self.css_extra, &mut errors);
        let common = CommonFields { label, css_extra };
        if let Err(e) = common.validate() {
            errors.merge(FieldErrors::from(e));
        }

        let mut type_values = values.clone();
        type_values.remove("label");
        type_values.remove("css_extra");
        let payload = match block_type.clean(&type_values, ctx) {
            Ok(payload) => payload,
            Err(e) => {
                errors.merge(e);
                Payload::new()
            }
        };

        errors.into_result()?;

        self.label = common.label;
        self.css_extra = common.css_extra;
        self.payload = payload;
        Ok(())
    }
}

fn string_field(values: &Payload, name: &str, current: &str, errors: &mut FieldErrors) -> String {
    match values.get(name) {
        None | Some(serde_json::Value::Null) => current.to_string(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(_) => {
            errors.add(name, "Expected a text value");
            current.to_string()
        }
    }
}
