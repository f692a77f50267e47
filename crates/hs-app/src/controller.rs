//! Analysis panel controller.
//!
//! Wires a storm date to a background job run, tracks the run's observable
//! state, and exposes the decoded result tables for display. One run is in
//! flight at a time. Starting a new run or cancelling bumps the generation,
//! so messages still arriving from an older run are dropped.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use hs_jobs::{
    Artifact, CancelToken, GeometryArtifact, JobError, JobOrchestrator, JobParameters, JobResult,
    JobService, JobStatus,
};
use hs_present::{DisplayGroup, PresentOptions, ResultTablePresenter};
use hs_results::{ResultGroup, decode_payload};

use crate::config::AppConfig;
use crate::date::{parse_storm_date, service_date};
use crate::error::{AppError, AppResult};
use crate::progress::{RunProgressEvent, RunStage};
use crate::ticker::ElapsedTicker;
use crate::worker::{RunWorker, WorkerEvent, WorkerMessage, WorkerPlan};

pub const STATUS_WAITING: &str = "Waiting for user input";
pub const STATUS_RUNNING: &str = "Running analysis...";
pub const STATUS_COMPLETE: &str = "Analysis complete";
pub const STATUS_INVALID: &str = "Invalid data format returned";
pub const STATUS_FAILED: &str = "Failed to process results";
pub const STATUS_TIMED_OUT: &str = "Analysis timed out";
pub const STATUS_CANCELLED: &str = "Analysis cancelled";

/// Receives the geometry output for display on the map.
pub trait GeometrySink {
    fn show_geometry(&mut self, layer: GeometryArtifact);

    /// Remove whatever a previous run displayed.
    fn clear(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelView {
    DateEntry,
    Tables,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    Ready,
    Failed,
    TimedOut,
    Cancelled,
}

#[derive(Debug)]
pub struct PanelState {
    pub phase: RunPhase,
    pub status_text: String,
    pub job_status: Option<JobStatus>,
    pub view: PanelView,
    pub ready: bool,
    pub groups: Vec<ResultGroup>,
    pub geometry_pending: bool,
    pub geometry_error: Option<JobError>,
    pub last_error: Option<AppError>,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            phase: RunPhase::Idle,
            status_text: STATUS_WAITING.to_string(),
            job_status: None,
            view: PanelView::DateEntry,
            ready: false,
            groups: Vec::new(),
            geometry_pending: false,
            geometry_error: None,
            last_error: None,
        }
    }
}

type ProgressObserver = Box<dyn FnMut(&RunProgressEvent)>;

pub struct AnalysisController<S: JobService + ?Sized + 'static> {
    orchestrator: JobOrchestrator<S>,
    config: AppConfig,
    presenter: ResultTablePresenter,
    options: PresentOptions,
    state: PanelState,
    generation: u64,
    run_started: Option<Instant>,
    cancel: Option<CancelToken>,
    ticker: Option<ElapsedTicker>,
    tx: Sender<WorkerMessage>,
    rx: Receiver<WorkerMessage>,
    sink: Option<Box<dyn GeometrySink>>,
    observer: Option<ProgressObserver>,
}

impl<S: JobService + ?Sized + 'static> AnalysisController<S> {
    pub fn new(service: Arc<S>, config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let presenter = ResultTablePresenter::new(config.presenter.color_band()?);
        let options = config.presenter.options.clone();
        let (tx, rx) = mpsc::channel();

        Ok(Self {
            orchestrator: JobOrchestrator::new(service),
            config,
            presenter,
            options,
            state: PanelState::default(),
            generation: 0,
            run_started: None,
            cancel: None,
            ticker: None,
            tx,
            rx,
            sink: None,
            observer: None,
        })
    }

    pub fn with_geometry_sink(mut self, sink: Box<dyn GeometrySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_progress(mut self, observer: ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn endpoint(&self) -> String {
        self.config.deployment.endpoint()
    }

    pub fn can_submit(&self) -> bool {
        self.state.phase != RunPhase::Running
    }

    /// Elapsed time of the current (or last) run; frozen once it ends.
    pub fn elapsed(&self) -> Duration {
        self.ticker
            .as_ref()
            .map(ElapsedTicker::elapsed)
            .unwrap_or_default()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(ElapsedTicker::is_running)
    }

    /// Start a run for the date typed by the user.
    ///
    /// Returns the run's generation. Progress is observed through
    /// [`pump`](Self::pump) / [`wait_for_run`](Self::wait_for_run) and
    /// [`state`](Self::state).
    pub fn run(&mut self, date_input: &str) -> AppResult<u64> {
        if !self.can_submit() {
            return Err(AppError::RunInProgress);
        }
        let date = match parse_storm_date(date_input) {
            Ok(date) => date,
            Err(e) => {
                self.state.status_text = e.to_string();
                return Err(e);
            }
        };

        self.generation += 1;
        let generation = self.generation;
        self.reset_for_run();

        let parameters =
            JobParameters::new().with(self.config.job.date_parameter.clone(), service_date(date));
        let plan = WorkerPlan {
            parameters,
            poll: self.config.polling.poll_options(),
            geometry_output: self.config.job.geometry_output.clone(),
            table_output: self.config.job.table_output.clone(),
        };

        let cancel = CancelToken::new();
        self.cancel = Some(cancel.clone());
        self.ticker = Some(ElapsedTicker::start(self.config.polling.tick()));
        self.run_started = Some(Instant::now());

        tracing::info!(generation, date = %date, endpoint = %self.endpoint(), "starting analysis run");
        self.emit(RunStage::Submitting, None, Some("Submitting job".to_string()));

        RunWorker::start(
            self.orchestrator.clone(),
            plan,
            cancel,
            generation,
            self.tx.clone(),
        );
        Ok(generation)
    }

    /// Stop the current run. Late messages from it are ignored.
    pub fn cancel(&mut self) {
        if self.state.phase != RunPhase::Running && !self.state.geometry_pending {
            return;
        }
        let was_running = self.state.phase == RunPhase::Running;
        self.generation += 1;
        self.stop_run_resources();
        self.state.geometry_pending = false;
        if was_running {
            self.state.phase = RunPhase::Cancelled;
            self.state.status_text = STATUS_CANCELLED.to_string();
            tracing::info!("analysis run cancelled");
            self.emit(RunStage::Cancelled, None, None);
        }
    }

    /// Apply all pending worker messages without blocking.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.handle(message);
            handled += 1;
        }
        handled
    }

    /// Block until the current run leaves `Running` or `timeout` elapses.
    pub fn wait_for_run(&mut self, timeout: Duration) -> bool {
        self.wait_until(timeout, |state| state.phase != RunPhase::Running)
    }

    /// Like [`wait_for_run`](Self::wait_for_run), but also waits for the
    /// geometry output.
    pub fn wait_for_idle(&mut self, timeout: Duration) -> bool {
        self.wait_until(timeout, |state| {
            state.phase != RunPhase::Running && !state.geometry_pending
        })
    }

    /// Take the error that ended the last run, if any.
    pub fn take_error(&mut self) -> Option<AppError> {
        self.state.last_error.take()
    }

    pub fn present_options(&self) -> &PresentOptions {
        &self.options
    }

    pub fn set_show_all_columns(&mut self, show: bool) {
        self.options.show_all_columns = show;
    }

    /// Display model for the current results; empty unless ready.
    pub fn display(&self) -> Vec<DisplayGroup> {
        if !self.state.ready {
            return Vec::new();
        }
        self.presenter.present(&self.state.groups, &self.options)
    }

    pub fn back_to_date_entry(&mut self) {
        self.state.view = PanelView::DateEntry;
    }

    pub fn show_tables(&mut self) -> bool {
        if self.state.ready {
            self.state.view = PanelView::Tables;
        }
        self.state.ready
    }

    fn wait_until(&mut self, timeout: Duration, done: impl Fn(&PanelState) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        self.pump();
        while !done(&self.state) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.rx.recv_timeout(remaining) {
                Ok(message) => self.handle(message),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return done(&self.state);
                }
            }
        }
        true
    }

    fn reset_for_run(&mut self) {
        self.stop_run_resources();
        self.state = PanelState {
            phase: RunPhase::Running,
            status_text: STATUS_RUNNING.to_string(),
            ..PanelState::default()
        };
        if let Some(sink) = self.sink.as_mut() {
            sink.clear();
        }
    }

    fn stop_run_resources(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if let Some(ticker) = self.ticker.as_mut() {
            ticker.stop();
        }
    }

    fn handle(&mut self, message: WorkerMessage) {
        if message.generation != self.generation {
            tracing::debug!(
                generation = message.generation,
                current = self.generation,
                "ignoring message from superseded run"
            );
            return;
        }

        match message.event {
            WorkerEvent::Status(status) => self.on_status(status),
            WorkerEvent::Failed(error) => {
                tracing::error!(error = %error, "analysis run failed");
                self.finish(RunPhase::Failed, STATUS_FAILED, RunStage::Failed);
                self.state.last_error = Some(AppError::Job(error));
            }
            WorkerEvent::Stopped(status) => self.on_stopped(status),
            WorkerEvent::Table(result) => self.on_table(result),
            WorkerEvent::Geometry(result) => self.on_geometry(result),
        }
    }

    fn on_status(&mut self, status: JobStatus) {
        if self.state.phase != RunPhase::Running {
            return;
        }
        self.state.job_status = Some(status);
        self.state.status_text = format!("Processing: {status}");
        if status == JobStatus::Succeeded {
            self.state.geometry_pending = true;
            self.emit(RunStage::FetchingResults, Some(status), None);
        } else {
            self.emit(RunStage::Polling, Some(status), None);
        }
    }

    fn on_stopped(&mut self, status: JobStatus) {
        self.state.job_status = Some(status);
        match status {
            JobStatus::TimedOut => {
                self.finish(RunPhase::TimedOut, STATUS_TIMED_OUT, RunStage::TimedOut)
            }
            JobStatus::Cancelled => {
                self.finish(RunPhase::Cancelled, STATUS_CANCELLED, RunStage::Cancelled)
            }
            _ => self.finish(RunPhase::Failed, STATUS_FAILED, RunStage::Failed),
        }
    }

    fn on_table(&mut self, result: JobResult<Artifact>) {
        let groups = result
            .map_err(AppError::from)
            .and_then(|artifact| {
                artifact.into_json().ok_or_else(|| {
                    AppError::InvalidResultFormat("table output is not a JSON document".to_string())
                })
            })
            .and_then(|value| decode_payload(&value).map_err(AppError::from));

        match groups {
            Ok(groups) => {
                tracing::info!(groups = groups.len(), "result tables loaded");
                self.state.groups = groups;
                self.state.ready = true;
                self.state.view = PanelView::Tables;
                self.finish(RunPhase::Ready, STATUS_COMPLETE, RunStage::Completed);
            }
            Err(error @ AppError::InvalidResultFormat(_)) => {
                tracing::warn!(error = %error, "table output rejected");
                self.finish(RunPhase::Failed, STATUS_INVALID, RunStage::InvalidResult);
                self.state.last_error = Some(error);
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to fetch table output");
                self.finish(RunPhase::Failed, STATUS_FAILED, RunStage::Failed);
                self.state.last_error = Some(error);
            }
        }
    }

    fn on_geometry(&mut self, result: JobResult<Artifact>) {
        self.state.geometry_pending = false;
        match result.map(Artifact::into_geometry) {
            Ok(Some(layer)) => {
                tracing::debug!(features = layer.features.len(), "geometry output received");
                if let Some(sink) = self.sink.as_mut() {
                    sink.show_geometry(layer);
                }
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(error = %error, "geometry output unavailable");
                self.state.geometry_error = Some(error);
            }
        }
    }

    fn finish(&mut self, phase: RunPhase, status_text: &str, stage: RunStage) {
        self.state.phase = phase;
        self.state.status_text = status_text.to_string();
        if phase != RunPhase::Ready {
            self.state.ready = false;
            self.state.groups.clear();
            self.state.view = PanelView::DateEntry;
        }
        self.cancel = None;
        if let Some(ticker) = self.ticker.as_mut() {
            ticker.stop();
        }
        let job_status = self.state.job_status;
        self.emit(stage, job_status, None);
    }

    fn emit(&mut self, stage: RunStage, job_status: Option<JobStatus>, message: Option<String>) {
        let elapsed = self
            .run_started
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or_default();
        if let Some(observer) = self.observer.as_mut() {
            observer(&RunProgressEvent {
                job_status,
                ..RunProgressEvent::stage(self.generation, stage, elapsed, message)
            });
        }
    }
}

impl<S: JobService + ?Sized + 'static> Drop for AnalysisController<S> {
    fn drop(&mut self) {
        self.stop_run_resources();
    }
}
