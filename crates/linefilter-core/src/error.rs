//! Error types for line classification.

use thiserror::Error;

/// Failure kinds raised while classifying a single polyline or while
/// validating the class table at startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("polyline has {found} vertices, at least 2 are required")]
    InsufficientVertices { found: usize },

    #[error("point ({x}, {y}) falls outside the raster (col {col}, row {row} in {cols}x{rows} grid)")]
    OutOfBounds {
        x: f64,
        y: f64,
        col: i64,
        row: i64,
        cols: usize,
        rows: usize,
    },

    #[error("raster value {0} is not claimed by any class")]
    UnknownClass(i64),

    #[error("invalid class configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

/// Result alias used across the core crate.
pub type Result<T> = std::result::Result<T, ClassifyError>;
