//! Error types for dataset parsing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading gesture recordings from disk.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("label file missing in {path}: {source}")]
    MissingLabelFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed label file {path}: {reason}")]
    MalformedLabelFile { path: PathBuf, reason: String },

    #[error("cannot derive gesture name from {0}")]
    MissingGestureName(PathBuf),

    #[error("unknown gesture '{gesture}' for sample {path}")]
    UnknownGesture { gesture: String, path: PathBuf },

    #[error("invalid label map: {0}")]
    InvalidLabelMap(String),

    #[error("unsupported data type '{0}' (expected 'pcd' or 'proxy')")]
    UnsupportedDataType(String),

    #[error("PCD parsing error in {path}: {reason}")]
    Pcd { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for data operations.
pub type Result<T> = std::result::Result<T, DataError>;
