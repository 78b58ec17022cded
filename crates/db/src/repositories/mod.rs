//! Repository layer.
//!
//! Each repository is a zero-sized struct with async methods that take a
//! `&PgPool`. Multi-statement operations run in one transaction and lock
//! the section rows whose children or blocks they renumber.

pub mod hierarchy_repo;
pub mod page_block_repo;
pub mod page_visit_repo;
pub mod section_repo;
pub mod section_version_repo;
pub mod user_visit_repo;

pub use hierarchy_repo::HierarchyRepo;
pub use page_block_repo::PageBlockRepo;
pub use page_visit_repo::PageVisitRepo;
pub use section_repo::SectionRepo;
pub use section_version_repo::SectionVersionRepo;
pub use user_visit_repo::UserVisitRepo;
