//! Error types for job orchestration.

use thiserror::Error;

use crate::status::JobStatus;

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum JobError {
    /// The service was unreachable or rejected the parameters.
    #[error("Job submission failed: {message}")]
    Submission { message: String },

    /// Status checks kept failing past the retry budget.
    #[error("Job status polling failed after {attempts} consecutive attempts: {message}")]
    Poll { attempts: u32, message: String },

    #[error("Job output not found: {name}")]
    ArtifactNotFound { name: String },

    #[error("Job output '{name}' could not be decoded: {reason}")]
    ArtifactFormat { name: String, reason: String },

    /// Transport failure while fetching an output.
    #[error("Failed to fetch job output '{name}': {message}")]
    Fetch { name: String, message: String },

    /// Outputs were requested from a job that did not succeed.
    #[error("Job is not complete (status: {status})")]
    NotComplete { status: JobStatus },
}
