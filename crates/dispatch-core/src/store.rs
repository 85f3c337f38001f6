//! The store contract (§4.2): the seven operations the scheduler needs
//! from a persistence backend, independent of the engine behind it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::model::{Job, JobId, NewJob, NodeTask, NodeTaskStatus, TaskResult, TaskStatus};

/// Persistence contract backing the scheduler.
///
/// Implementations must provide the atomicity the scheduler leans on at
/// two specific points: `push_task_to_node` is an upsert-with-array-push
/// (safe to run concurrently across distinct nodes — different partition
/// keys), and `pull_task_from_node` reports whether it actually removed an
/// entry so the scheduler can detect and retry a lost claim race (§5).
#[async_trait]
pub trait Store: Send + Sync {
    /// Assign an id and persist `job` atomically.
    async fn insert_job(&self, job: NewJob) -> StoreResult<JobId>;

    /// Upsert the node's queue document and append `task` to its array.
    async fn push_task_to_node(&self, node_name: &str, task: &NodeTask) -> StoreResult<()>;

    /// Read a node's queue. `None` if the node has no queue document yet.
    async fn read_node_queue(&self, node_name: &str) -> StoreResult<Option<Vec<NodeTask>>>;

    /// Remove the first queued entry matching `job_id`. Returns `true` if an
    /// entry was actually removed, `false` if it was already gone (lost a
    /// race, or never existed).
    async fn pull_task_from_node(&self, node_name: &str, job_id: &str) -> StoreResult<bool>;

    /// Upsert the `(node_name, job_id)` status row.
    async fn upsert_status(
        &self,
        node_name: &str,
        job_id: &str,
        status: TaskStatus,
        last_updated: DateTime<Utc>,
        result: Option<TaskResult>,
    ) -> StoreResult<()>;

    /// Strongly-consistent read by id.
    async fn get_job(&self, job_id: &str) -> StoreResult<Option<Job>>;

    /// Query status rows by secondary index on `job_id`.
    async fn list_statuses_by_job(&self, job_id: &str) -> StoreResult<Vec<NodeTaskStatus>>;
}
