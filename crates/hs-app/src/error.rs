//! Error types for the hs-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates and
/// provides a unified error interface for frontends.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Bad local input; the job service was not contacted.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("A run is already in progress")]
    RunInProgress,

    #[error("Job error: {0}")]
    Job(#[from] hs_jobs::JobError),

    #[error("Invalid result format: {0}")]
    InvalidResultFormat(String),

    #[error("Presentation error: {0}")]
    Present(#[from] hs_present::PresentError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hs-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<hs_results::ResultsError> for AppError {
    fn from(err: hs_results::ResultsError) -> Self {
        match err {
            hs_results::ResultsError::InvalidFormat { reason } => AppError::InvalidResultFormat(reason),
        }
    }
}
