//! Route definitions for the `/hierarchies` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::hierarchy;
use crate::state::AppState;

/// Routes mounted at `/hierarchies`.
///
/// ```text
/// GET    /                    -> list
/// POST   /                    -> import
/// GET    /{name}              -> export
/// DELETE /{name}              -> delete
/// GET    /{name}/resolve      -> resolve
/// GET    /{name}/location     -> location
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(hierarchy::list).post(hierarchy::import))
        .route("/{name}", get(hierarchy::export).delete(hierarchy::delete))
        .route("/{name}/resolve", get(hierarchy::resolve))
        .route("/{name}/location", get(hierarchy::location))
}
