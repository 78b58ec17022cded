use std::sync::Arc;

use pagetree_core::block_type::BlockTypeRegistry;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: pagetree_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Block types known to this server, fixed at startup.
    pub block_types: Arc<BlockTypeRegistry>,
}
