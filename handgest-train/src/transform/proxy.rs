//! Proxy image frames (`*.jpg`) to RGBD tensors.

use super::{FrameTransform, RGBD_CHANNELS};
use crate::error::TransformError;
use image::imageops::FilterType;
use ndarray::Array3;
use std::path::Path;

/// Decodes an image, resizes it and lays it out as `[4, H, W]`.
///
/// Channels 0..3 hold RGB in `[0, 1]`; proxy images carry no depth so the
/// last channel is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyImageTransform {
    width: u32,
    height: u32,
}

impl ProxyImageTransform {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl FrameTransform for ProxyImageTransform {
    fn frame_shape(&self) -> [usize; 3] {
        [RGBD_CHANNELS, self.height as usize, self.width as usize]
    }

    fn apply(&self, frame: &Path, _slot: usize) -> Result<Array3<f32>, TransformError> {
        let image = image::open(frame)?
            .resize_exact(self.width, self.height, FilterType::Triangle)
            .to_rgb8();

        let mut tensor =
            Array3::<f32>::zeros((RGBD_CHANNELS, self.height as usize, self.width as usize));
        for (x, y, pixel) in image.enumerate_pixels() {
            for c in 0..3 {
                tensor[[c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
            }
        }
        Ok(tensor)
    }
}
