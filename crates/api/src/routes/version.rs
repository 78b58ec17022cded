//! Route definitions for the `/versions` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::version;
use crate::state::AppState;

/// Routes mounted at `/versions`.
///
/// ```text
/// GET    /{id}               -> get_by_id
/// GET    /{id}/more-recent   -> more_recent
/// POST   /{id}/revert        -> revert
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(version::get_by_id))
        .route("/{id}/more-recent", get(version::more_recent))
        .route("/{id}/revert", post(version::revert))
}
