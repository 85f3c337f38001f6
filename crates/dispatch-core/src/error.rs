//! Error types returned by the scheduler and the store contract.

use thiserror::Error;

/// Errors surfaced by a [`crate::store::Store`] implementation.
///
/// Deliberately backend-agnostic: the contract in §4.2 of the spec names
/// operations any compliant store must support, not a specific engine's
/// error taxonomy, so failures are collapsed to a single opaque variant.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by [`crate::scheduler::Scheduler`] operations.
///
/// The single error type every scheduler operation returns; handlers in
/// `dispatch-web` translate each variant to its HTTP status per §7.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A job or status-update submission failed validation. The message is
    /// the exact user-facing text (field or index identified).
    #[error("{0}")]
    Validation(String),

    /// The requested job does not exist.
    #[error("job not found")]
    NotFound,

    /// No eligible task is available for the polling node right now.
    #[error("no tasks available")]
    NoTasks,

    /// The store failed. Detail is logged, never surfaced to the caller.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Alias for `Result<T, SchedulerError>`.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
