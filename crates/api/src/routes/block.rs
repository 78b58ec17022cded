//! Route definitions for the `/blocks` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::block;
use crate::state::AppState;

/// Routes mounted at `/blocks`.
///
/// ```text
/// GET    /{id}   -> get_by_id
/// PUT    /{id}   -> edit
/// DELETE /{id}   -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        get(block::get_by_id).put(block::edit).delete(block::delete),
    )
}
