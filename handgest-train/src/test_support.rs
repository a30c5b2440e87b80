//! Fixtures shared by the pipeline tests.

use crate::error::TransformError;
use crate::transform::FrameTransform;
use ndarray::Array3;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary dataset laid out as `<root>/G01/<gesture>/session/<name>`.
pub struct SampleTree {
    dir: TempDir,
}

impl SampleTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Create a sample with `frames` empty `NNNN.pcd` files and a `label.txt`.
    pub fn sample(&self, gesture: &str, name: &str, frames: usize, label: &str) -> PathBuf {
        let dir = self.root().join("G01").join(gesture).join("session").join(name);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..frames {
            fs::write(dir.join(format!("{i:04}.pcd")), b"").unwrap();
        }
        fs::write(dir.join("label.txt"), label).unwrap();
        dir
    }
}

/// Encodes `[frame index, sample number, slot]` into a `[1, 1, 3]` tensor.
///
/// The frame index comes from the file stem, the sample number from the
/// digits of the sample folder name (`s12` → 12).
pub struct IndexTransform;

fn digits(s: &str) -> Option<f32> {
    let digits: String = s.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<f32>().ok()
}

impl FrameTransform for IndexTransform {
    fn frame_shape(&self) -> [usize; 3] {
        [1, 1, 3]
    }

    fn apply(&self, frame: &Path, slot: usize) -> Result<Array3<f32>, TransformError> {
        let index = frame
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<f32>().ok())
            .ok_or_else(|| TransformError::Shape(format!("bad frame name {}", frame.display())))?;
        let sample = frame
            .parent()
            .and_then(Path::file_name)
            .and_then(|s| s.to_str())
            .and_then(digits)
            .unwrap_or(-1.0);
        Ok(Array3::from_shape_vec((1, 1, 3), vec![index, sample, slot as f32]).unwrap())
    }
}

/// Decoded `(frame index, sample number, slot)` of an [`IndexTransform`] tensor.
pub fn decode(frame: &Array3<f32>) -> (usize, usize, usize) {
    (
        frame[[0, 0, 0]] as usize,
        frame[[0, 0, 1]] as usize,
        frame[[0, 0, 2]] as usize,
    )
}
