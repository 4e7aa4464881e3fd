//! Run model - one sweep execution with its parameters and lifecycle.

use serde::{Deserialize, Serialize};

use crate::id::RunId;
use crate::Time;

/// One sweep over a batch of items.
///
/// Runs are never deleted; once DONE or FAILED they form an immutable
/// audit trail of what was swept and with which parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Unique identifier
    pub id: RunId,

    /// Parameters the run was started with
    pub params: RunParams,

    /// Lifecycle status
    pub status: RunStatus,

    /// Aggregated outcome counts, present once the run finished
    pub summary: Option<RunSummary>,

    /// Error message when the run FAILED
    pub error: Option<String>,

    /// When the run record was created
    pub created_at: Time,

    /// When the batch was fetched and workers started
    pub started_at: Option<Time>,

    /// When the run reached DONE or FAILED
    pub finished_at: Option<Time>,
}

impl Run {
    /// Create a new run in PENDING state.
    pub fn new(params: RunParams) -> Self {
        Self {
            id: RunId::new(),
            params,
            status: RunStatus::Pending,
            summary: None,
            error: None,
            created_at: chrono::Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }
}

/// Which items a run covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemSelection {
    /// Contiguous base-question sequence range, inclusive on both ends
    Range {
        /// First sequence number
        from: i64,
        /// Last sequence number
        to: i64,
    },

    /// Explicit variant ids
    Ids(Vec<i64>),
}

/// Parameters of a sweep run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    /// Items the run covers
    pub selection: ItemSelection,

    /// Apply proposed fixes automatically when the gate allows it
    pub apply: bool,

    /// Escalate items to the judge model after precheck
    pub use_judge: bool,

    /// Requested worker cap; clamped to the supported range at execution time
    pub concurrency: usize,
}

/// Run lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Created, batch not yet fetched
    #[serde(rename = "PENDING")]
    Pending,
    /// Workers are processing the batch
    #[serde(rename = "RUNNING")]
    Running,
    /// Every item processed; summary available
    #[serde(rename = "DONE")]
    Done,
    /// Orchestration itself errored; message in `error`
    #[serde(rename = "FAILED")]
    Failed,
}

impl RunStatus {
    /// Storage/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        }
    }

    /// DONE and FAILED are final; no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "RUNNING" => Ok(Self::Running),
            "DONE" => Ok(Self::Done),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

/// Aggregated outcome counts of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Items fetched for the run
    pub total: u64,

    /// Items that passed every check they were subjected to
    pub accepted: u64,

    /// Items flagged by precheck or the judge
    pub rejected: u64,

    /// Items whose fixes were applied automatically
    pub fixed: u64,

    /// Items whose handler errored
    pub errors: u64,

    /// Items skipped because the run was cancelled
    pub skipped: u64,
}
