//! Application configuration loaded from JSON and overridden from the CLI.

use crate::error::{AppError, Result};
use handgest_data::{DataType, LabelMap};
use handgest_train::PipelineConfig;
use handgest_train::transform::{Intrinsics, Jitter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Point cloud rendering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Required for `pcd` data.
    pub intrinsics: Option<Intrinsics>,
    /// Rotation about X, in degrees.
    pub angle_deg: f32,
    pub z_target: f32,
    pub jitter: Option<Jitter>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        let third = 1.0 / 1.5;
        Self {
            intrinsics: None,
            angle_deg: -30.0,
            z_target: 1.25,
            jitter: Some(Jitter {
                loc: [0.0; 6],
                scale: [
                    std::f32::consts::PI / 24.0 * third,
                    std::f32::consts::PI / 18.0 * third,
                    std::f32::consts::PI / 48.0 * third,
                    0.2 * third,
                    0.1 * third,
                    0.1 * third,
                ],
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root holding `G*/<gesture>/<a>/<b>` sample folders.
    pub data_dir: PathBuf,
    /// Gestures to train on, numbered from 1 in order.
    pub gestures: Vec<String>,
    /// Explicit label map JSON; overrides `gestures` numbering when set.
    pub label_map: Option<PathBuf>,
    pub test_fraction: f64,
    pub split_seed: u64,
    pub epochs: usize,
    /// Run the validation loader every this many epochs; 0 disables it.
    pub validate_each_epoch: usize,
    /// Stop each pass after this many batches.
    pub max_batches: Option<usize>,
    /// Output `[height, width]` of every frame tensor.
    pub image_size: [u32; 2],
    pub projection: ProjectionConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("dataset"),
            gestures: vec!["select".to_string()],
            label_map: None,
            test_fraction: 0.25,
            split_seed: 0,
            epochs: 1,
            validate_each_epoch: 1,
            max_batches: None,
            image_size: [72, 128],
            projection: ProjectionConfig::default(),
            pipeline: PipelineConfig::default().max_workers(2).target_fps(5),
            logging: LoggingConfig::default(),
        }
    }
}

/// Values given on the command line; `None` keeps the file's value.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub max_workers: Option<usize>,
    pub target_fps: Option<u32>,
    pub data_type: Option<DataType>,
    pub seed: Option<u64>,
    pub epochs: Option<usize>,
    pub max_batches: Option<usize>,
    pub log_level: Option<String>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| AppError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| AppError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(v) = overrides.data_dir {
            self.data_dir = v;
        }
        if let Some(v) = overrides.batch_size {
            self.pipeline.batch_size = v;
        }
        if let Some(v) = overrides.max_workers {
            self.pipeline.max_workers = v;
        }
        if let Some(v) = overrides.target_fps {
            self.pipeline.target_fps = v;
        }
        if let Some(v) = overrides.data_type {
            self.pipeline.data_type = v;
        }
        if let Some(v) = overrides.seed {
            self.pipeline.seed = Some(v);
        }
        if let Some(v) = overrides.epochs {
            self.epochs = v;
        }
        if overrides.max_batches.is_some() {
            self.max_batches = overrides.max_batches;
        }
        if let Some(v) = overrides.log_level {
            self.logging.level = v;
        }
    }

    /// Checks that do not touch the filesystem.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.test_fraction) {
            return Err(AppError::Config(format!(
                "test_fraction must be in [0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.image_size.contains(&0) {
            return Err(AppError::Config("image_size must be non-zero".into()));
        }
        if self.gestures.is_empty() {
            return Err(AppError::Config("no gestures configured".into()));
        }
        if self.pipeline.data_type == DataType::Pcd && self.projection.intrinsics.is_none() {
            return Err(AppError::Config("pcd data requires projection.intrinsics".into()));
        }
        self.pipeline.frame_rate()?;
        Ok(())
    }

    /// Label map from file, or numbered from `gestures`.
    pub fn label_map(&self) -> Result<LabelMap> {
        Ok(match &self.label_map {
            Some(path) => LabelMap::load(path)?,
            None => LabelMap::from_gestures(&self.gestures)?,
        })
    }

    pub fn height(&self) -> u32 {
        self.image_size[0]
    }

    pub fn width(&self) -> u32 {
        self.image_size[1]
    }
}
