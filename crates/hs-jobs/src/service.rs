//! Seam to the external job execution service.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::status::RemoteStatus;

/// Job inputs by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobParameters(BTreeMap<String, String>);

impl JobParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Service-assigned job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteJobId(pub String);

impl fmt::Display for RemoteJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ServiceError {
    #[error("service unreachable: {0}")]
    Unreachable(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("no output named '{name}'")]
    OutputNotFound { name: String },

    #[error("operation not supported by the service")]
    Unsupported,
}

/// External long-running job service.
///
/// Implementations perform one network round trip per call and must be
/// shareable across the threads of a single run.
pub trait JobService: Send + Sync {
    fn submit(&self, parameters: &JobParameters) -> Result<RemoteJobId, ServiceError>;

    fn check_status(&self, job: &RemoteJobId) -> Result<RemoteStatus, ServiceError>;

    /// Fetch the `value` of a named output of a finished job.
    fn fetch_output(&self, job: &RemoteJobId, name: &str) -> Result<Value, ServiceError>;

    /// Ask the service to stop the job. Best-effort.
    fn cancel(&self, _job: &RemoteJobId) -> Result<(), ServiceError> {
        Err(ServiceError::Unsupported)
    }
}

impl<S: JobService + ?Sized> JobService for Arc<S> {
    fn submit(&self, parameters: &JobParameters) -> Result<RemoteJobId, ServiceError> {
        (**self).submit(parameters)
    }

    fn check_status(&self, job: &RemoteJobId) -> Result<RemoteStatus, ServiceError> {
        (**self).check_status(job)
    }

    fn fetch_output(&self, job: &RemoteJobId, name: &str) -> Result<Value, ServiceError> {
        (**self).fetch_output(job, name)
    }

    fn cancel(&self, job: &RemoteJobId) -> Result<(), ServiceError> {
        (**self).cancel(job)
    }
}
