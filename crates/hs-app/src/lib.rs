//! Shared application layer for the hail swath analysis panel.
//!
//! This crate provides a single interface for CLI and GUI frontends. It
//! resolves the deployment endpoint, validates the storm date, runs the
//! analysis job in the background and turns its table output into a display
//! model.

pub mod config;
pub mod controller;
pub mod date;
pub mod error;
pub mod progress;
pub mod ticker;
pub mod worker;

// Re-export key types for convenience
pub use config::{
    AppConfig, DeploymentConfig, HOST_ENV_VAR, JobConfig, PollingConfig, PresenterConfig,
};
pub use controller::{AnalysisController, GeometrySink, PanelState, PanelView, RunPhase};
pub use date::{parse_storm_date, service_date};
pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage};
pub use ticker::ElapsedTicker;
