//! SQLite implementation of the [`dispatch_core::Store`] contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dispatch_core::error::{StoreError, StoreResult};
use dispatch_core::model::{Job, JobId, NewJob, NodeRef, NodeTask, NodeTaskStatus, TaskResult, TaskStatus};
use dispatch_core::store::Store;
use serde_json::value::RawValue;
use tracing::instrument;
use uuid::Uuid;

use crate::db::Database;
use crate::error::SqlError;

fn to_store_err(e: SqlError) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// SQLite-backed [`Store`]. Cheaply cloneable — wraps a [`Database`] handle.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for SqliteStore {
    #[instrument(skip(self, job))]
    async fn insert_job(&self, job: NewJob) -> StoreResult<JobId> {
        let id = Uuid::now_v7().to_string();
        let nodes_json = serde_json::to_string(&job.nodes).map_err(|e| to_store_err(e.into()))?;
        let spec = job.task.spec.get().to_string();
        let window_start = job.task.window_start.to_rfc3339();
        let window_end = job.task.window_end.to_rfc3339();
        let provider = job.task.provider.clone();
        let created_at = Utc::now().timestamp();

        let id_for_insert = id.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO jobs (id, window_start, window_end, provider, spec, nodes, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![
                        id_for_insert,
                        window_start,
                        window_end,
                        provider,
                        spec,
                        nodes_json,
                        created_at
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(to_store_err)?;

        Ok(id)
    }

    #[instrument(skip(self, task))]
    async fn push_task_to_node(&self, node_name: &str, task: &NodeTask) -> StoreResult<()> {
        let node_name = node_name.to_string();
        let job_id = task
            .job_id
            .clone()
            .expect("tasks pushed to a node queue are always stamped with a job_id");
        let window_start = task.window_start.to_rfc3339();
        let window_end = task.window_end.to_rfc3339();
        let provider = task.provider.clone();
        let spec = task.spec.get().to_string();

        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO node_queues (node_name, job_id, window_start, window_end, provider, spec) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
                     ON CONFLICT(node_name, job_id) DO UPDATE SET \
                        window_start = excluded.window_start, \
                        window_end = excluded.window_end, \
                        provider = excluded.provider, \
                        spec = excluded.spec",
                    rusqlite::params![node_name, job_id, window_start, window_end, provider, spec],
                )?;
                Ok(())
            })
            .await
            .map_err(to_store_err)
    }

    #[instrument(skip(self))]
    async fn read_node_queue(&self, node_name: &str) -> StoreResult<Option<Vec<NodeTask>>> {
        let node_name = node_name.to_string();
        let tasks = self
            .db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT job_id, window_start, window_end, provider, spec \
                     FROM node_queues WHERE node_name = ?1",
                )?;
                let rows = stmt.query_map(rusqlite::params![node_name], |row| {
                    let job_id: String = row.get(0)?;
                    let window_start: String = row.get(1)?;
                    let window_end: String = row.get(2)?;
                    let provider: String = row.get(3)?;
                    let spec: String = row.get(4)?;
                    Ok((job_id, window_start, window_end, provider, spec))
                })?;

                let mut tasks = Vec::new();
                for row in rows {
                    let (job_id, window_start, window_end, provider, spec) = row?;
                    tasks.push(row_to_node_task(job_id, window_start, window_end, provider, spec)?);
                }
                Ok(tasks)
            })
            .await
            .map_err(to_store_err)?;

        Ok(Some(tasks))
    }

    #[instrument(skip(self))]
    async fn pull_task_from_node(&self, node_name: &str, job_id: &str) -> StoreResult<bool> {
        let node_name = node_name.to_string();
        let job_id = job_id.to_string();
        let changed = self
            .db
            .execute(move |conn| {
                let n = conn.execute(
                    "DELETE FROM node_queues WHERE node_name = ?1 AND job_id = ?2",
                    rusqlite::params![node_name, job_id],
                )?;
                Ok(n)
            })
            .await
            .map_err(to_store_err)?;
        Ok(changed > 0)
    }

    #[instrument(skip(self, result))]
    async fn upsert_status(
        &self,
        node_name: &str,
        job_id: &str,
        status: TaskStatus,
        last_updated: DateTime<Utc>,
        result: Option<TaskResult>,
    ) -> StoreResult<()> {
        let node_name = node_name.to_string();
        let job_id = job_id.to_string();
        let status = status.to_string();
        let last_updated = last_updated.to_rfc3339();
        let exit_code = result.as_ref().map(|r| r.exit_code as i64);
        let reason = result.and_then(|r| r.reason);

        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO node_task_status (node_name, job_id, status, last_updated, exit_code, reason) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
                     ON CONFLICT(node_name, job_id) DO UPDATE SET \
                        status = excluded.status, \
                        last_updated = excluded.last_updated, \
                        exit_code = excluded.exit_code, \
                        reason = excluded.reason",
                    rusqlite::params![node_name, job_id, status, last_updated, exit_code, reason],
                )?;
                Ok(())
            })
            .await
            .map_err(to_store_err)
    }

    #[instrument(skip(self))]
    async fn get_job(&self, job_id: &str) -> StoreResult<Option<Job>> {
        let job_id = job_id.to_string();
        let job = self
            .db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT id, window_start, window_end, provider, spec, nodes \
                     FROM jobs WHERE id = ?1",
                    rusqlite::params![job_id],
                    |row| {
                        let id: String = row.get(0)?;
                        let window_start: String = row.get(1)?;
                        let window_end: String = row.get(2)?;
                        let provider: String = row.get(3)?;
                        let spec: String = row.get(4)?;
                        let nodes: String = row.get(5)?;
                        Ok((id, window_start, window_end, provider, spec, nodes))
                    },
                );

                match result {
                    Ok((id, window_start, window_end, provider, spec, nodes_json)) => {
                        let task = row_to_node_task(id.clone(), window_start, window_end, provider, spec)?;
                        let nodes: Vec<NodeRef> = serde_json::from_str(&nodes_json)?;
                        Ok(Some(Job { id, task, nodes }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(SqlError::from(e)),
                }
            })
            .await
            .map_err(to_store_err)?;

        Ok(job)
    }

    #[instrument(skip(self))]
    async fn list_statuses_by_job(&self, job_id: &str) -> StoreResult<Vec<NodeTaskStatus>> {
        let job_id = job_id.to_string();
        let statuses = self
            .db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT node_name, job_id, status, last_updated, exit_code, reason \
                     FROM node_task_status WHERE job_id = ?1 ORDER BY node_name",
                )?;
                let rows = stmt.query_map(rusqlite::params![job_id], |row| {
                    let node_name: String = row.get(0)?;
                    let job_id: String = row.get(1)?;
                    let status: String = row.get(2)?;
                    let last_updated: String = row.get(3)?;
                    let exit_code: Option<i64> = row.get(4)?;
                    let reason: Option<String> = row.get(5)?;
                    Ok((node_name, job_id, status, last_updated, exit_code, reason))
                })?;

                let mut statuses = Vec::new();
                for row in rows {
                    let (node_name, job_id, status, last_updated, exit_code, reason) = row?;
                    statuses.push(NodeTaskStatus {
                        job_id,
                        node_name,
                        status: status.parse().expect("status column is CHECK-constrained"),
                        last_updated: DateTime::parse_from_rfc3339(&last_updated)
                            .map_err(|e| {
                                SqlError::Migration {
                                    version: 0,
                                    message: format!("corrupt last_updated timestamp: {e}"),
                                }
                            })?
                            .with_timezone(&Utc),
                        result: exit_code.map(|exit_code| TaskResult {
                            exit_code: exit_code as i32,
                            reason,
                        }),
                    });
                }
                Ok(statuses)
            })
            .await
            .map_err(to_store_err)?;

        Ok(statuses)
    }
}

fn row_to_node_task(
    job_id: String,
    window_start: String,
    window_end: String,
    provider: String,
    spec: String,
) -> Result<NodeTask, SqlError> {
    let window_start = DateTime::parse_from_rfc3339(&window_start)
        .map_err(|e| SqlError::Migration {
            version: 0,
            message: format!("corrupt window_start timestamp: {e}"),
        })?
        .with_timezone(&Utc);
    let window_end = DateTime::parse_from_rfc3339(&window_end)
        .map_err(|e| SqlError::Migration {
            version: 0,
            message: format!("corrupt window_end timestamp: {e}"),
        })?
        .with_timezone(&Utc);
    let spec: Box<RawValue> = RawValue::from_string(spec)?;

    Ok(NodeTask {
        job_id: Some(job_id),
        window_start,
        window_end,
        provider,
        spec,
    })
}
