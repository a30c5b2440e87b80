//! Pipeline configuration

use crate::error::Result;
use crate::resample::FrameRate;
use handgest_data::DataType;
use serde::{Deserialize, Serialize};

/// Configuration shared by every worker dataset of a loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Global number of slots per step, summed over workers.
    pub batch_size: usize,
    /// Upper bound on worker threads.
    pub max_workers: usize,
    /// Native capture rate of the recordings.
    pub base_fps: u32,
    /// Rate at which frames are emitted.
    pub target_fps: u32,
    /// Which frame files to read.
    pub data_type: DataType,
    /// Seed for the per-slot shuffles; `None` draws from entropy.
    pub seed: Option<u64>,
    /// Steps each worker may run ahead of the assembler.
    pub prefetch: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            max_workers: 1,
            base_fps: 30,
            target_fps: 30,
            data_type: DataType::Pcd,
            seed: None,
            prefetch: 2,
        }
    }
}

impl PipelineConfig {
    pub fn batch_size(mut self, value: usize) -> Self {
        self.batch_size = value;
        self
    }

    pub fn max_workers(mut self, value: usize) -> Self {
        self.max_workers = value;
        self
    }

    pub fn base_fps(mut self, value: u32) -> Self {
        self.base_fps = value;
        self
    }

    pub fn target_fps(mut self, value: u32) -> Self {
        self.target_fps = value;
        self
    }

    pub fn data_type(mut self, value: DataType) -> Self {
        self.data_type = value;
        self
    }

    pub fn seed(mut self, value: u64) -> Self {
        self.seed = Some(value);
        self
    }

    pub fn prefetch(mut self, value: usize) -> Self {
        self.prefetch = value;
        self
    }

    /// Validated frame rate pair.
    pub fn frame_rate(&self) -> Result<FrameRate> {
        FrameRate::new(self.base_fps, self.target_fps)
    }
}
