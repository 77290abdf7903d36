// src/error.rs

use std::error::Error;
use thiserror::Error;

/// Error type shared by all pipeline stages.
///
/// Stages fail fast with one of three kinds and the pipeline hands the error
/// back to its caller untouched.
#[derive(Debug, Error)]
pub enum PcaError {
    /// Degenerate input sizes (zero rows, a single row where two are needed)
    /// or invalid configuration values.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Rows of unequal length, or an eigenvector whose length does not match
    /// the matrix dimension.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The eigen-solver could not decompose the matrix.
    #[error("eigen-decomposition failed: {message}")]
    DecompositionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn Error + Send + Sync + 'static>>,
    },
}

impl PcaError {
    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        PcaError::InvalidInput(msg.into())
    }

    pub(crate) fn shape_mismatch(msg: impl Into<String>) -> Self {
        PcaError::ShapeMismatch(msg.into())
    }

    pub(crate) fn decomposition_failed(msg: impl Into<String>) -> Self {
        PcaError::DecompositionFailed {
            message: msg.into(),
            source: None,
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, PcaError::InvalidInput(_))
    }

    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, PcaError::ShapeMismatch(_))
    }

    pub fn is_decomposition_failed(&self) -> bool {
        matches!(self, PcaError::DecompositionFailed { .. })
    }
}
