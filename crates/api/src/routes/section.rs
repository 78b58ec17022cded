//! Route definitions for the `/sections` resource.
//!
//! Block, progress and version routes scoped to one section are nested here
//! as well.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{block, progress, section, version};
use crate::state::AppState;

/// Routes mounted at `/sections`.
///
/// ```text
/// GET    /{id}                    -> section::get_by_id
/// PUT    /{id}                    -> section::update
/// DELETE /{id}                    -> section::delete
/// GET    /{id}/export             -> section::export
/// POST   /{id}/children           -> section::add_child
/// POST   /{id}/reorder-children   -> section::reorder_children
/// POST   /{id}/move               -> section::move_section
///
/// POST   /{id}/blocks             -> block::create
/// POST   /{id}/reorder-blocks     -> block::reorder
///
/// POST   /{id}/visit              -> progress::record_visit
/// GET    /{id}/status             -> progress::get_status
/// PUT    /{id}/status             -> progress::set_status
///
/// GET    /{id}/versions           -> version::list_by_section
/// POST   /{id}/versions           -> version::save
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(section::get_by_id)
                .put(section::update)
                .delete(section::delete),
        )
        .route("/{id}/export", get(section::export))
        .route("/{id}/children", post(section::add_child))
        .route("/{id}/reorder-children", post(section::reorder_children))
        .route("/{id}/move", post(section::move_section))
        .route("/{id}/blocks", post(block::create))
        .route("/{id}/reorder-blocks", post(block::reorder))
        .route("/{id}/visit", post(progress::record_visit))
        .route(
            "/{id}/status",
            get(progress::get_status).put(progress::set_status),
        )
        .route(
            "/{id}/versions",
            get(version::list_by_section).post(version::save),
        )
}
