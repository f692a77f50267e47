//! Scripted job service.
//!
//! Plays back a fixed sequence of status responses and serves named outputs
//! from memory. Once the script runs out, the last reported status repeats.

use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::service::{JobParameters, JobService, RemoteJobId, ServiceError};
use crate::status::RemoteStatus;

type StatusStep = Result<RemoteStatus, ServiceError>;

#[derive(Debug)]
pub struct ReplayJobService {
    script: Mutex<VecDeque<StatusStep>>,
    last: Mutex<RemoteStatus>,
    outputs: BTreeMap<String, Value>,
    fetch_delays: BTreeMap<String, Duration>,
    rejection: Option<String>,
    supports_cancel: bool,
    submissions: Mutex<Vec<JobParameters>>,
    status_checks: AtomicUsize,
    cancel_requests: AtomicUsize,
}

impl Default for ReplayJobService {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayJobService {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(RemoteStatus::Submitted),
            outputs: BTreeMap::new(),
            fetch_delays: BTreeMap::new(),
            rejection: None,
            supports_cancel: true,
            submissions: Mutex::new(Vec::new()),
            status_checks: AtomicUsize::new(0),
            cancel_requests: AtomicUsize::new(0),
        }
    }

    pub fn with_statuses(self, statuses: impl IntoIterator<Item = RemoteStatus>) -> Self {
        lock(&self.script).extend(statuses.into_iter().map(Ok));
        self
    }

    /// Append a failed status check to the script.
    pub fn with_status_failure(self, message: impl Into<String>) -> Self {
        lock(&self.script).push_back(Err(ServiceError::Unreachable(message.into())));
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, value: Value) -> Self {
        self.outputs.insert(name.into(), value);
        self
    }

    pub fn with_fetch_delay(mut self, name: impl Into<String>, delay: Duration) -> Self {
        self.fetch_delays.insert(name.into(), delay);
        self
    }

    /// Reject every submission with the given reason.
    pub fn rejecting(mut self, reason: impl Into<String>) -> Self {
        self.rejection = Some(reason.into());
        self
    }

    pub fn without_cancel(mut self) -> Self {
        self.supports_cancel = false;
        self
    }

    pub fn submissions(&self) -> Vec<JobParameters> {
        lock(&self.submissions).clone()
    }

    pub fn status_checks(&self) -> usize {
        self.status_checks.load(Ordering::SeqCst)
    }

    pub fn cancel_requests(&self) -> usize {
        self.cancel_requests.load(Ordering::SeqCst)
    }
}

impl JobService for ReplayJobService {
    fn submit(&self, parameters: &JobParameters) -> Result<RemoteJobId, ServiceError> {
        if let Some(reason) = &self.rejection {
            return Err(ServiceError::Rejected(reason.clone()));
        }
        let mut submissions = lock(&self.submissions);
        submissions.push(parameters.clone());
        Ok(RemoteJobId(format!("replay-{}", submissions.len())))
    }

    fn check_status(&self, _job: &RemoteJobId) -> Result<RemoteStatus, ServiceError> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        let step = lock(&self.script).pop_front();
        match step {
            Some(Ok(status)) => {
                *lock(&self.last) = status;
                Ok(status)
            }
            Some(Err(e)) => Err(e),
            None => Ok(*lock(&self.last)),
        }
    }

    fn fetch_output(&self, _job: &RemoteJobId, name: &str) -> Result<Value, ServiceError> {
        if let Some(delay) = self.fetch_delays.get(name) {
            std::thread::sleep(*delay);
        }
        self.outputs
            .get(name)
            .cloned()
            .ok_or_else(|| ServiceError::OutputNotFound {
                name: name.to_string(),
            })
    }

    fn cancel(&self, _job: &RemoteJobId) -> Result<(), ServiceError> {
        self.cancel_requests.fetch_add(1, Ordering::SeqCst);
        if self.supports_cancel {
            Ok(())
        } else {
            Err(ServiceError::Unsupported)
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
