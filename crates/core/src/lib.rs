//! Hierarchy engine: section trees, content blocks, block types, the nested
//! exchange format, per-user progress and version snapshots.
//!
//! Everything here is synchronous and storage-agnostic. `pagetree-db`
//! persists the same model to PostgreSQL.

pub mod block;
pub mod block_type;
pub mod clock;
pub mod error;
pub mod exchange;
pub mod hierarchy;
pub mod ordering;
pub mod progress;
pub mod registry;
pub mod section;
pub mod slug;
pub mod types;
pub mod version;
