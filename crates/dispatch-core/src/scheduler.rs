//! Pure scheduling logic: validation, fan-out, claim, status upsert.
//!
//! Holds no I/O of its own — every side effect goes through the [`Store`]
//! contract, so this module is testable against an in-memory fake without
//! touching a real database (see `tests` below and the `test-support`
//! fakes used across the teacher crates this workspace is patterned on).

use std::sync::Arc;

use chrono::Utc;
use serde_json::value::RawValue;
use tracing::{debug, instrument, warn};

use crate::error::{SchedulerError, SchedulerResult};
use crate::model::{
    Job, JobId, JobSubmission, JobWithStatuses, NewJob, NodeRef, NodeTask, StatusUpdate,
};
use crate::store::Store;

/// `null` used when a job submission omits `spec` entirely.
fn null_spec() -> Box<RawValue> {
    RawValue::from_string("null".to_string()).expect("\"null\" is valid JSON")
}

/// The job/task scheduling and status-tracking core.
///
/// Cheaply cloneable — the inner `Arc<dyn Store>` is the only state, the
/// same "global store handle passed by reference" shape the design notes
/// call for.
#[derive(Clone)]
pub struct Scheduler {
    store: Arc<dyn Store>,
}

impl Scheduler {
    /// Construct a scheduler over any compliant store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Validate and persist a job, then fan its task out to every distinct
    /// target node. Returns the assigned job id.
    #[instrument(skip(self, submission))]
    pub async fn submit_job(&self, submission: JobSubmission) -> SchedulerResult<JobId> {
        validate_submission(&submission)?;

        let JobSubmission { nodes, task } = submission;
        let node_task = NodeTask {
            job_id: None,
            window_start: task.window_start.expect("validated present"),
            window_end: task.window_end.expect("validated present"),
            provider: task.provider,
            spec: task.spec.unwrap_or_else(null_spec),
        };

        let job_id = self
            .store
            .insert_job(NewJob {
                task: node_task.clone(),
                nodes: nodes.clone(),
            })
            .await?;

        debug!(job_id = %job_id, node_count = nodes.len(), "job inserted, fanning out");

        // Fan out to each distinct node in parallel; per §4.1.1 this is
        // unordered and best-effort — a partial failure surfaces to the
        // caller rather than rolling back already-pushed nodes.
        let mut seen = std::collections::HashSet::new();
        let mut pushes = Vec::new();
        for node in &nodes {
            let canonical = node.canonical_name();
            if !seen.insert(canonical.clone()) {
                continue;
            }
            let mut stamped = node_task.clone();
            stamped.job_id = Some(job_id.clone());
            pushes.push(async move { self.store.push_task_to_node(&canonical, &stamped).await });
        }
        futures::future::try_join_all(pushes).await?;

        Ok(job_id)
    }

    /// Claim the next eligible task for `node`, expiring any passed-window
    /// tasks encountered along the way. Peek-expire-pop per §4.1.2.
    #[instrument(skip(self))]
    pub async fn claim_next_task(&self, node: &NodeRef) -> SchedulerResult<NodeTask> {
        let canonical = node.canonical_name();

        loop {
            let tasks = match self.store.read_node_queue(&canonical).await? {
                Some(tasks) if !tasks.is_empty() => tasks,
                _ => return Err(SchedulerError::NoTasks),
            };

            // Smallest window_start wins; first occurrence on ties.
            let candidate = tasks
                .into_iter()
                .min_by_key(|t| t.window_start)
                .expect("non-empty");

            let job_id = candidate
                .job_id
                .clone()
                .expect("queued tasks are always stamped with a job_id");

            let now = Utc::now();

            if now < candidate.window_start {
                // No later-starting task can be earlier; the queue is
                // blocked behind this one by design.
                return Err(SchedulerError::NoTasks);
            }

            if now > candidate.window_end {
                let pulled = self.store.pull_task_from_node(&canonical, &job_id).await?;
                if pulled {
                    self.store
                        .upsert_status(
                            &canonical,
                            &job_id,
                            crate::model::TaskStatus::Expired,
                            now,
                            None,
                        )
                        .await?;
                    debug!(node = %canonical, job_id = %job_id, "task expired on claim pass");
                }
                // Whether we won the race or not, loop and reconsider the
                // (now-changed) queue state.
                continue;
            }

            // Eligible.
            let pulled = self.store.pull_task_from_node(&canonical, &job_id).await?;
            if !pulled {
                // Lost the race to another concurrent claimer; retry.
                warn!(node = %canonical, job_id = %job_id, "lost claim race, retrying");
                continue;
            }

            self.store
                .upsert_status(
                    &canonical,
                    &job_id,
                    crate::model::TaskStatus::Pending,
                    now,
                    None,
                )
                .await?;

            return Ok(candidate);
        }
    }

    /// Record a node-reported status update for a claimed task.
    ///
    /// No server-side transition legality check: the node is trusted to
    /// report monotone progress, per §4.1.3.
    #[instrument(skip(self, update))]
    pub async fn update_status(&self, node: &NodeRef, update: StatusUpdate) -> SchedulerResult<()> {
        if update.job_id.is_empty() {
            return Err(SchedulerError::Validation("job_id must be provided".into()));
        }

        let status: crate::model::TaskStatus = update
            .status
            .parse()
            .map_err(|_| SchedulerError::Validation(format!("invalid status: {}", update.status)))?;

        if !status.is_node_reportable() {
            return Err(SchedulerError::Validation(format!(
                "invalid status: {status}"
            )));
        }

        self.store
            .upsert_status(
                &node.canonical_name(),
                &update.job_id,
                status,
                Utc::now(),
                update.result,
            )
            .await?;

        Ok(())
    }

    /// Fetch a job, optionally attaching every status row that matches it.
    #[instrument(skip(self))]
    pub async fn get_job(&self, job_id: &str, fetch_statuses: bool) -> SchedulerResult<JobWithStatuses> {
        let job: Job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or(SchedulerError::NotFound)?;

        let statuses = if fetch_statuses {
            Some(self.store.list_statuses_by_job(job_id).await?)
        } else {
            None
        };

        Ok(JobWithStatuses { job, statuses })
    }
}

/// Validate a job submission, in the exact order and with the exact
/// messages specified in §4.1.1.
fn validate_submission(submission: &JobSubmission) -> SchedulerResult<()> {
    if submission.nodes.is_empty() {
        return Err(SchedulerError::Validation("no nodes provided".into()));
    }
    for (i, node) in submission.nodes.iter().enumerate() {
        if !node.is_valid() {
            return Err(SchedulerError::Validation(format!(
                "nodes[{i}] is not a valid node"
            )));
        }
    }

    let window_start = submission
        .task
        .window_start
        .ok_or_else(|| SchedulerError::Validation("window_start must be provided".into()))?;
    let window_end = submission
        .task
        .window_end
        .ok_or_else(|| SchedulerError::Validation("window_end must be provided".into()))?;

    if window_end <= window_start {
        return Err(SchedulerError::Validation(
            "window_end must be after window_start".into(),
        ));
    }

    if window_end < Utc::now() {
        return Err(SchedulerError::Validation(
            "window has already expired".into(),
        ));
    }

    if submission.task.provider.is_empty() {
        return Err(SchedulerError::Validation(
            "task provider must be provided".into(),
        ));
    }

    Ok(())
}
