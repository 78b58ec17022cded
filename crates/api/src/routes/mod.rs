pub mod block;
pub mod health;
pub mod hierarchy;
pub mod section;
pub mod version;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /hierarchies                                list, import
/// /hierarchies/{name}                         export, delete
/// /hierarchies/{name}/resolve?path=           section at a url path
/// /hierarchies/{name}/location                user's current section
///
/// /sections/{id}                              view, edit, delete
/// /sections/{id}/export                       subtree in exchange format
/// /sections/{id}/children                     add child subtree (POST)
/// /sections/{id}/reorder-children             reorder children (POST)
/// /sections/{id}/move                         re-parent (POST)
/// /sections/{id}/blocks                       add block (POST)
/// /sections/{id}/reorder-blocks               reorder blocks (POST)
/// /sections/{id}/visit                        record visit (POST)
/// /sections/{id}/status                       get, set page status
/// /sections/{id}/versions                     list, save
///
/// /blocks/{id}                                get, edit, delete
///
/// /versions/{id}                              get
/// /versions/{id}/more-recent                  newer versions in subtree
/// /versions/{id}/revert                       restore (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/hierarchies", hierarchy::router())
        .nest("/sections", section::router())
        .nest("/blocks", block::router())
        .nest("/versions", version::router())
}
