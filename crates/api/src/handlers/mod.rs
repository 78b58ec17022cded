//! HTTP handlers, one module per resource.

pub mod block;
pub mod hierarchy;
pub mod progress;
pub mod section;
pub mod version;

use pagetree_core::error::CoreError;
use pagetree_core::hierarchy::Hierarchy;
use pagetree_core::types::DbId;
use pagetree_db::repositories::{HierarchyRepo, SectionRepo};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

fn not_found(entity: &'static str, id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity, id })
}

/// Fail with 404 unless the section exists.
async fn require_section(state: &AppState, section_id: DbId) -> AppResult<()> {
    SectionRepo::find_by_id(&state.pool, section_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| not_found("section", section_id))
}

/// Load the whole hierarchy that contains `section_id`.
async fn load_tree_of_section(state: &AppState, section_id: DbId) -> AppResult<Hierarchy> {
    let section = SectionRepo::find_by_id(&state.pool, section_id)
        .await?
        .ok_or_else(|| not_found("section", section_id))?;
    HierarchyRepo::load_tree(&state.pool, section.hierarchy_id)
        .await?
        .ok_or_else(|| not_found("hierarchy", section.hierarchy_id))
}

/// Load a hierarchy by its unique name.
async fn load_tree_by_name(state: &AppState, name: &str) -> AppResult<Hierarchy> {
    HierarchyRepo::load_tree_by_name(&state.pool, name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Hierarchy '{name}' not found")))
}
