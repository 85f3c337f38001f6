//! SQLite-backed implementation of [`dispatch_core::store::Store`].
//!
//! Layering:
//! - [`db`] — connection lifecycle, pragmas, and the blocking-pool bridge.
//! - [`migration`] — versioned, idempotent schema migrations.
//! - [`sqlite_store`] — the [`dispatch_core::store::Store`] adapter itself.
//! - [`error`] — internal SQLite/JSON failure plumbing, collapsed to
//!   `dispatch_core::StoreError::Backend` at the trait boundary.

pub mod db;
pub mod error;
pub mod migration;
pub mod sqlite_store;

pub use db::Database;
pub use sqlite_store::SqliteStore;
