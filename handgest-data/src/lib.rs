//! Handgest Data Crate
//!
//! Parsing utilities for hand-gesture recordings: `label.txt` intervals, the
//! gesture label map, per-sample frame listing and PCD point clouds.
//! This crate knows nothing about batching or tensors; the streaming pipeline
//! lives in `handgest-train`.

pub mod error;
pub mod label;
pub mod pcd;
pub mod sample;
pub mod types;

pub use error::DataError;
pub use label::{ClassId, LabelInterval, LabelMap, NO_GESTURE, gesture_name};
pub use pcd::load_point_cloud;
pub use sample::{DataType, discover_samples, list_frames, train_test_split};
pub use types::{Point, PointCloud};
