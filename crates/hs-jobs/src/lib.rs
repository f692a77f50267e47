//! Long-running analysis job orchestration.
//!
//! The analysis itself runs on an external geoprocessing service. This crate
//! submits a parameterized job, polls it to a terminal status with bounded
//! retries, a timeout, and cooperative cancellation, then fetches named
//! outputs and decodes them into typed artifacts.
//!
//! # Architecture
//!
//! - [`service`]: the [`JobService`] seam to the external service
//! - [`status`]: job status state machine and the service's status vocabulary
//! - [`orchestrator`]: submit / poll / fetch over a [`JobService`]
//! - [`artifact`]: typed job outputs
//! - [`cancel`]: cancellation token shared between a run and its owner
//! - [`replay`]: scripted [`JobService`] for tests and offline replay

pub mod artifact;
pub mod cancel;
pub mod error;
pub mod orchestrator;
pub mod replay;
pub mod service;
pub mod status;

pub use artifact::{Artifact, ArtifactKind, GeometryArtifact};
pub use cancel::CancelToken;
pub use error::{JobError, JobResult};
pub use orchestrator::{JobHandle, JobOrchestrator, PollOptions};
pub use replay::ReplayJobService;
pub use service::{JobParameters, JobService, RemoteJobId, ServiceError};
pub use status::{JobStatus, RemoteStatus};
