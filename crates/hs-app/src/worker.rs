//! Background execution of one analysis run.
//!
//! The worker submits the job, polls it, and on success fetches the geometry
//! and table outputs concurrently. Every message carries the generation of
//! the run that produced it so the controller can discard late messages from
//! a superseded run.

use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use hs_jobs::{
    Artifact, ArtifactKind, CancelToken, JobError, JobOrchestrator, JobParameters, JobResult,
    JobService, JobStatus, PollOptions,
};

#[derive(Debug)]
pub struct WorkerMessage {
    pub generation: u64,
    pub event: WorkerEvent,
}

#[derive(Debug)]
pub enum WorkerEvent {
    Status(JobStatus),
    /// Submission or polling failed.
    Failed(JobError),
    /// Polling stopped in a terminal status other than `Succeeded`.
    Stopped(JobStatus),
    Table(JobResult<Artifact>),
    Geometry(JobResult<Artifact>),
}

#[derive(Debug, Clone)]
pub struct WorkerPlan {
    pub parameters: JobParameters,
    pub poll: PollOptions,
    pub geometry_output: String,
    pub table_output: String,
}

pub struct RunWorker;

impl RunWorker {
    pub fn start<S>(
        orchestrator: JobOrchestrator<S>,
        plan: WorkerPlan,
        cancel: CancelToken,
        generation: u64,
        tx: Sender<WorkerMessage>,
    ) -> JoinHandle<()>
    where
        S: JobService + ?Sized + 'static,
    {
        thread::spawn(move || Self::run(&orchestrator, plan, &cancel, generation, &tx))
    }

    fn run<S>(
        orchestrator: &JobOrchestrator<S>,
        plan: WorkerPlan,
        cancel: &CancelToken,
        generation: u64,
        tx: &Sender<WorkerMessage>,
    ) where
        S: JobService + ?Sized,
    {
        let send = |event: WorkerEvent| {
            // The controller may be gone; nothing to report to then.
            let _ = tx.send(WorkerMessage { generation, event });
        };

        let mut handle = match orchestrator.submit(plan.parameters) {
            Ok(handle) => handle,
            Err(e) => {
                send(WorkerEvent::Failed(e));
                return;
            }
        };
        send(WorkerEvent::Status(JobStatus::Submitted));

        let polled =
            orchestrator.poll_until_terminal(&mut handle, &plan.poll, cancel, &mut |status| {
                send(WorkerEvent::Status(status))
            });

        tracing::info!(
            job = %handle.id(),
            parameters = ?handle.parameters(),
            status = %handle.status(),
            age = ?handle.age(),
            "job polling finished"
        );

        match polled {
            Ok(JobStatus::Succeeded) => {
                let handle = &handle;
                thread::scope(|scope| {
                    let geometry_tx = tx.clone();
                    let geometry_name = plan.geometry_output.as_str();
                    scope.spawn(move || {
                        let result =
                            orchestrator.fetch_artifact(handle, geometry_name, ArtifactKind::Geometry);
                        let _ = geometry_tx.send(WorkerMessage {
                            generation,
                            event: WorkerEvent::Geometry(result),
                        });
                    });

                    let table =
                        orchestrator.fetch_artifact(handle, &plan.table_output, ArtifactKind::Json);
                    send(WorkerEvent::Table(table));
                });
            }
            Ok(status) => send(WorkerEvent::Stopped(status)),
            Err(e) => send(WorkerEvent::Failed(e)),
        }
    }
}
