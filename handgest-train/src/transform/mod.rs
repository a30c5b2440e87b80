//! Frame transforms
//!
//! A transform turns one frame file into a fixed-shape `[C, H, W]` tensor.
//! It receives the slot index so augmentation can stay stable per slot.
//! Transforms are shared by every worker thread and must not hold
//! unsynchronized mutable state.

mod projection;
mod proxy;

pub use projection::{Intrinsics, Jitter, PointCloudProjection};
pub use proxy::ProxyImageTransform;

use crate::error::TransformError;
use ndarray::Array3;
use std::path::Path;

/// Converts a frame reference into a tensor.
pub trait FrameTransform: Send + Sync {
    /// Shape `[C, H, W]` of every tensor returned by [`apply`](Self::apply).
    fn frame_shape(&self) -> [usize; 3];

    /// Transform the frame at `frame` for the given slot.
    fn apply(&self, frame: &Path, slot: usize) -> Result<Array3<f32>, TransformError>;
}

/// Channels produced by the shipped transforms: RGB plus depth.
pub const RGBD_CHANNELS: usize = 4;
