//! Error types for presentation.

use thiserror::Error;

/// Result type for presentation operations.
pub type PresentResult<T> = Result<T, PresentError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PresentError {
    /// The raw input is not an array of result groups.
    #[error("Invalid presenter input: {what}")]
    InvalidInput { what: String },

    /// A color band could not be built from the given breakpoints.
    #[error("Invalid color band: {what}")]
    InvalidBand { what: String },
}
