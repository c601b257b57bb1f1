//! Error types for the segmentation engine.

use thiserror::Error;

/// Errors reported by the SLIC pipeline.
#[derive(Debug, Error, PartialEq)]
pub enum SlicError {
    /// Two grids that must share dimensions do not, or a buffer does not fit its dimensions.
    #[error("dimension mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    DimensionMismatch {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    /// A parameter is outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Connectivity needs at least one center to derive the size threshold.
    #[error("no cluster centers: step is too large for the grid")]
    NoCenters,

    /// The engine was asked for results before `generate_superpixels` ran.
    #[error("superpixels have not been generated yet")]
    NotGenerated,
}

/// Result type for the SLIC pipeline.
pub type SlicResult<T> = Result<T, SlicError>;
