use pagetree_core::error::CoreError;

/// Failure of a repository operation that checks tree invariants.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl DbError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        DbError::Core(CoreError::NotFound { entity, id })
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        DbError::Core(CoreError::Validation(msg.into()))
    }
}
