use pagetree_core::block::ContentBlock;
use pagetree_core::types::{DbId, Payload, Timestamp};
use serde::Serialize;
use sqlx::FromRow;
use sqlx::types::Json;

/// A row from the `page_blocks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PageBlockRow {
    pub id: DbId,
    pub section_id: DbId,
    pub ordinality: i32,
    pub label: String,
    pub css_extra: String,
    pub block_type: String,
    pub payload: Json<Payload>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<PageBlockRow> for ContentBlock {
    fn from(row: PageBlockRow) -> Self {
        ContentBlock {
            id: row.id,
            section_id: row.section_id,
            ordinality: row.ordinality,
            label: row.label,
            css_extra: row.css_extra,
            block_type: row.block_type,
            payload: row.payload.0,
        }
    }
}
