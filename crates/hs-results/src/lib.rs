//! hs-results: tabular analysis output model and validated decoding.
//!
//! The analysis job produces a JSON document that is an array of labelled
//! table sections. This crate owns the typed form of that document and the
//! single decoding boundary where non-conforming payloads are rejected.

pub mod decode;
pub mod types;

pub use decode::{decode_groups, decode_payload};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ResultsError {
    #[error("Invalid result format: {reason}")]
    InvalidFormat { reason: String },
}

impl ResultsError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ResultsError::InvalidFormat {
            reason: reason.into(),
        }
    }
}
