//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct matching the
//! database row, and the input DTOs its repository accepts.

pub mod hierarchy;
pub mod page_block;
pub mod page_visit;
pub mod section;
pub mod section_version;
pub mod user_visit;
