//! Internal error type for the SQLite plumbing.
//!
//! `dispatch_core::StoreError` is deliberately backend-agnostic (a single
//! opaque `Backend(String)` variant) so it can't carry `From` impls for
//! `rusqlite::Error` without violating the orphan rule from this crate —
//! neither type is local here. This type collects the concrete failure
//! modes instead, and every [`crate::Store`](dispatch_core::Store) method
//! in `sqlite_store.rs` converts it to `StoreError::Backend` at the
//! boundary via `.map_err(|e| StoreError::Backend(e.to_string()))`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("migration {version} failed: {message}")]
    Migration { version: u32, message: String },

    #[error("background task failed: {0}")]
    TaskJoin(String),
}

pub type SqlResult<T> = Result<T, SqlError>;

impl From<tokio::task::JoinError> for SqlError {
    fn from(e: tokio::task::JoinError) -> Self {
        SqlError::TaskJoin(e.to_string())
    }
}
