//! Presentation of hail analysis results for display.
//!
//! This crate turns decoded result groups into a render-ready table model.
//! It owns no I/O and holds no state between calls: every presentation is
//! recomputed from the raw groups and the current options.
//!
//! # Architecture
//!
//! - [`color_band`]: breakpoint table mapping a size bucket to a row tint,
//!   with clamped extrapolation above the largest breakpoint
//! - [`presenter`]: row/group filtering, column visibility, positional total
//!   detection, and cell formatting
//! - [`display`]: the derived display model handed to a renderer

pub mod color_band;
pub mod display;
pub mod error;
pub mod presenter;

pub use color_band::{BandEntry, ColorBand, Rgb, color_for};
pub use display::{DisplayCell, DisplayColumn, DisplayGroup, DisplayRow};
pub use error::{PresentError, PresentResult};
pub use presenter::{PresentOptions, ResultTablePresenter, TOTAL_HIGHLIGHT, TOTAL_LABEL};
