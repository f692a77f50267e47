//! Job submission, polling, and output retrieval.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::artifact::{Artifact, ArtifactKind};
use crate::cancel::CancelToken;
use crate::error::{JobError, JobResult};
use crate::service::{JobParameters, JobService, RemoteJobId, ServiceError};
use crate::status::JobStatus;

/// Polling cadence and limits.
#[derive(Debug, Clone, PartialEq)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Option<Duration>,
    /// Consecutive failed status checks tolerated before giving up.
    pub retry_budget: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            timeout: None,
            retry_budget: 3,
        }
    }
}

/// A submitted job. Owned by whoever drives the run; not cloneable.
#[derive(Debug)]
pub struct JobHandle {
    id: RemoteJobId,
    parameters: JobParameters,
    status: JobStatus,
    submitted_at: Instant,
}

impl JobHandle {
    pub fn id(&self) -> &RemoteJobId {
        &self.id
    }

    pub fn parameters(&self) -> &JobParameters {
        &self.parameters
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn age(&self) -> Duration {
        self.submitted_at.elapsed()
    }

    /// Apply an observed status. Returns `true` if the status changed.
    fn advance(&mut self, next: JobStatus) -> bool {
        if self.status.can_transition_to(next) {
            tracing::debug!(job = %self.id, from = %self.status, to = %next, "job status changed");
            self.status = next;
            true
        } else {
            false
        }
    }
}

pub struct JobOrchestrator<S: ?Sized> {
    service: Arc<S>,
}

impl<S: ?Sized> Clone for JobOrchestrator<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S: JobService + ?Sized> JobOrchestrator<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn submit(&self, parameters: JobParameters) -> JobResult<JobHandle> {
        let id = self
            .service
            .submit(&parameters)
            .map_err(|e| JobError::Submission {
                message: e.to_string(),
            })?;
        tracing::info!(job = %id, "job submitted");

        Ok(JobHandle {
            id,
            parameters,
            status: JobStatus::Submitted,
            submitted_at: Instant::now(),
        })
    }

    /// Poll until the job reaches a terminal status.
    ///
    /// `on_status` fires once per observed status change, including the
    /// `TimedOut` or `Cancelled` status set locally when polling stops early.
    /// Status checks that fail are retried; `retry_budget` consecutive
    /// failures mark the job `Failed` and return [`JobError::Poll`].
    pub fn poll_until_terminal(
        &self,
        handle: &mut JobHandle,
        options: &PollOptions,
        cancel: &CancelToken,
        on_status: &mut dyn FnMut(JobStatus),
    ) -> JobResult<JobStatus> {
        if handle.status.is_terminal() {
            return Ok(handle.status);
        }

        let deadline = options.timeout.map(|t| Instant::now() + t);
        let budget = options.retry_budget.max(1);
        let mut failures = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Ok(self.stop(handle, JobStatus::Cancelled, on_status));
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::warn!(job = %handle.id, "job timed out");
                return Ok(self.stop(handle, JobStatus::TimedOut, on_status));
            }

            match self.service.check_status(&handle.id) {
                Ok(remote) => {
                    failures = 0;
                    let next = JobStatus::from(remote);
                    if handle.advance(next) {
                        on_status(next);
                    }
                    if handle.status.is_terminal() {
                        return Ok(handle.status);
                    }
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!(
                        job = %handle.id,
                        attempt = failures,
                        budget,
                        error = %e,
                        "job status check failed"
                    );
                    if failures >= budget {
                        if handle.advance(JobStatus::Failed) {
                            on_status(JobStatus::Failed);
                        }
                        return Err(JobError::Poll {
                            attempts: failures,
                            message: e.to_string(),
                        });
                    }
                }
            }

            let wait = match deadline {
                Some(d) => options
                    .interval
                    .min(d.saturating_duration_since(Instant::now())),
                None => options.interval,
            };
            cancel.wait_timeout(wait);
        }
    }

    /// Fetch and decode one named output of a succeeded job.
    pub fn fetch_artifact(
        &self,
        handle: &JobHandle,
        name: &str,
        kind: ArtifactKind,
    ) -> JobResult<Artifact> {
        if handle.status != JobStatus::Succeeded {
            return Err(JobError::NotComplete {
                status: handle.status,
            });
        }

        let value = self
            .service
            .fetch_output(&handle.id, name)
            .map_err(|e| match e {
                ServiceError::OutputNotFound { name } => JobError::ArtifactNotFound { name },
                other => JobError::Fetch {
                    name: name.to_string(),
                    message: other.to_string(),
                },
            })?;
        tracing::debug!(job = %handle.id, output = name, "job output fetched");

        Artifact::decode(name, kind, value)
    }

    fn stop(
        &self,
        handle: &mut JobHandle,
        status: JobStatus,
        on_status: &mut dyn FnMut(JobStatus),
    ) -> JobStatus {
        if handle.advance(status) {
            on_status(status);
        }
        match self.service.cancel(&handle.id) {
            Ok(()) => tracing::info!(job = %handle.id, "remote job cancellation requested"),
            Err(ServiceError::Unsupported) => {
                tracing::debug!(job = %handle.id, "service does not support cancellation")
            }
            Err(e) => tracing::warn!(job = %handle.id, error = %e, "remote job cancellation failed"),
        }
        handle.status
    }
}
