//! Domain types for jobs, tasks, nodes, and status reports.
//!
//! Mirrors the wire shapes exactly: field names are already snake_case,
//! so most types derive `Serialize`/`Deserialize` without renaming.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// A unique job identifier, assigned by the store on insertion.
pub type JobId = String;

/// A node reference as it appears in a job's `nodes[]` list.
///
/// This is deliberately a different shape from the canonical
/// `"{organization}/{name}"` string used for queue and status rows — see
/// [`NodeRef::canonical_name`] and the asymmetry note in `SPEC_FULL.md`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub organization: String,
    pub name: String,
}

impl NodeRef {
    /// The canonical `"{organization}/{name}"` form used as the queue and
    /// status partition key.
    pub fn canonical_name(&self) -> String {
        format!("{}/{}", self.organization, self.name)
    }

    /// `true` if both fields are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.organization.is_empty() && !self.name.is_empty()
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.name)
    }
}

/// The executable unit delivered to a node: provider + opaque spec + window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTask {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub job_id: Option<JobId>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub provider: String,
    /// Opaque JSON payload. Never parsed — stored and returned byte-for-byte.
    pub spec: Box<RawValue>,
}

/// A job as persisted: the task template plus its fan-out target set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub task: NodeTask,
    pub nodes: Vec<NodeRef>,
}

/// Lifecycle state of a `(node, job_id)` task assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Expired,
    Failed,
    Success,
}

impl TaskStatus {
    /// `true` once a status cannot be re-queued or further transitioned.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Expired | Self::Failed | Self::Success)
    }

    /// Statuses a node is permitted to report. Nodes never report `expired` —
    /// that transition is scheduler-originated only.
    pub fn is_node_reportable(self) -> bool {
        matches!(self, Self::Pending | Self::Running | Self::Failed | Self::Success)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Expired => "expired",
            Self::Failed => "failed",
            Self::Success => "success",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "expired" => Ok(Self::Expired),
            "failed" => Ok(Self::Failed),
            "success" => Ok(Self::Success),
            _ => Err(()),
        }
    }
}

/// Terminal outcome detail reported by a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
}

/// A `(node, job_id)` status row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTaskStatus {
    pub job_id: JobId,
    /// Canonical `"{organization}/{name}"` form — see the asymmetry note.
    pub node_name: String,
    pub status: TaskStatus,
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<TaskResult>,
}

/// A job submission before validation and ID assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSubmission {
    pub nodes: Vec<NodeRef>,
    pub task: TaskSubmission,
}

/// The task template portion of a job submission.
///
/// `window_start`/`window_end` are optional here purely so a missing field
/// can be distinguished from a present-but-zero one, matching the
/// "must be provided" validation step.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSubmission {
    #[serde(default)]
    pub window_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub window_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub spec: Option<Box<RawValue>>,
}

/// A status update reported by a node for one of its claimed tasks.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub job_id: JobId,
    pub status: String,
    #[serde(default)]
    pub result: Option<TaskResult>,
}

/// A new job ready to be persisted: validated, not yet assigned an id.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub task: NodeTask,
    pub nodes: Vec<NodeRef>,
}

/// Response payload for `GET /admin/jobs/{job_id}`.
#[derive(Debug, Clone, Serialize)]
pub struct JobWithStatuses {
    pub job: Job,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<NodeTaskStatus>>,
}
