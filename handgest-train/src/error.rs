//! Error types for the batch pipeline.

use handgest_data::DataError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while building or iterating the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("transform failed for {path}: {source}")]
    Transform {
        path: PathBuf,
        #[source]
        source: TransformError,
    },

    #[error("frame shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: [usize; 3],
        actual: Vec<usize>,
    },

    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },
}

/// Errors raised by a [`FrameTransform`](crate::transform::FrameTransform).
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("invalid transform output: {0}")]
    Shape(String),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
