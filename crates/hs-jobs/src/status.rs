//! Job status state machine.
//!
//! `Submitted -> Running -> {Succeeded | Failed}`, with `TimedOut` and
//! `Cancelled` reachable from either non-terminal state. Nothing leaves a
//! terminal state, and a report that would move backwards is ignored.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Submitted,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    TimedOut,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Submitted | JobStatus::Running)
    }

    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if self.is_terminal() || self == next {
            return false;
        }
        !matches!((self, next), (JobStatus::Running, JobStatus::Submitted))
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Submitted => "Submitted",
            JobStatus::Running => "Running",
            JobStatus::Succeeded => "Succeeded",
            JobStatus::Failed => "Failed",
            JobStatus::Cancelled => "Cancelled",
            JobStatus::TimedOut => "TimedOut",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status vocabulary reported by the geoprocessing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteStatus {
    New,
    Submitted,
    Waiting,
    Executing,
    Succeeded,
    Failed,
    TimedOut,
    Cancelling,
    Cancelled,
    Deleting,
    Deleted,
}

impl From<RemoteStatus> for JobStatus {
    fn from(remote: RemoteStatus) -> Self {
        match remote {
            RemoteStatus::New | RemoteStatus::Submitted | RemoteStatus::Waiting => {
                JobStatus::Submitted
            }
            RemoteStatus::Executing | RemoteStatus::Cancelling => JobStatus::Running,
            RemoteStatus::Succeeded => JobStatus::Succeeded,
            RemoteStatus::Failed | RemoteStatus::Deleting | RemoteStatus::Deleted => {
                JobStatus::Failed
            }
            RemoteStatus::TimedOut => JobStatus::TimedOut,
            RemoteStatus::Cancelled => JobStatus::Cancelled,
        }
    }
}

impl FromStr for RemoteStatus {
    type Err = String;

    /// Accepts both `Executing` and the service's `esriJobExecuting` form,
    /// case-insensitively. `Running` is accepted as an alias of `Executing`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bare = trimmed
            .strip_prefix("esriJob")
            .unwrap_or(trimmed)
            .to_ascii_lowercase();
        let status = match bare.as_str() {
            "new" => RemoteStatus::New,
            "submitted" => RemoteStatus::Submitted,
            "waiting" => RemoteStatus::Waiting,
            "executing" | "running" => RemoteStatus::Executing,
            "succeeded" => RemoteStatus::Succeeded,
            "failed" => RemoteStatus::Failed,
            "timedout" => RemoteStatus::TimedOut,
            "cancelling" => RemoteStatus::Cancelling,
            "cancelled" => RemoteStatus::Cancelled,
            "deleting" => RemoteStatus::Deleting,
            "deleted" => RemoteStatus::Deleted,
            _ => return Err(format!("unknown job status '{trimmed}'")),
        };
        Ok(status)
    }
}
