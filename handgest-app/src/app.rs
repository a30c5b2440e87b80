//! Dataset discovery, loader construction and the epoch loop.

use crate::config::{AppConfig, LoggingConfig};
use crate::error::{AppError, Result};
use handgest_data::{ClassId, DataType, LabelMap, discover_samples, train_test_split};
use handgest_train::{
    FrameTransform, MultiStreamLoader, PointCloudProjection, ProxyImageTransform,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Summary of one pass over a loader.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassStats {
    pub batches: usize,
    pub frames: usize,
    pub labels: BTreeMap<ClassId, usize>,
}

pub fn init_logging(logging: &LoggingConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level)),
        )
        .with_target(false)
        .init();
}

/// Frame transform matching the configured data type.
pub fn build_transform(config: &AppConfig) -> Result<Arc<dyn FrameTransform>> {
    let (width, height) = (config.width(), config.height());
    Ok(match config.pipeline.data_type {
        DataType::Proxy => Arc::new(ProxyImageTransform::new(width, height)),
        DataType::Pcd => {
            let projection = &config.projection;
            let intrinsics = projection
                .intrinsics
                .ok_or_else(|| AppError::Config("pcd data requires projection.intrinsics".into()))?;
            let mut transform = PointCloudProjection::new(intrinsics, width, height)
                .with_angle(projection.angle_deg.to_radians())
                .with_z_target(projection.z_target);
            if let Some(jitter) = projection.jitter {
                transform = transform.with_jitter(jitter, config.pipeline.seed.unwrap_or(0));
            }
            Arc::new(transform)
        }
    })
}

/// Drain one epoch, logging and counting what the loader produces.
pub fn run_pass(
    loader: &mut MultiStreamLoader,
    name: &str,
    max_batches: Option<usize>,
) -> Result<PassStats> {
    let mut stats = PassStats::default();
    for batch in loader.iter().take(max_batches.unwrap_or(usize::MAX)) {
        let batch = batch?;
        stats.batches += 1;
        stats.frames += batch.len();
        for &label in batch.labels.iter() {
            *stats.labels.entry(label).or_default() += 1;
        }
    }
    info!(
        pass = name,
        epoch = loader.epoch(),
        batches = stats.batches,
        frames = stats.frames,
        "labels {:?}",
        stats.labels
    );
    Ok(stats)
}

fn build_loader(
    config: &AppConfig,
    paths: Vec<PathBuf>,
    label_map: &LabelMap,
    transform: &Arc<dyn FrameTransform>,
) -> Result<MultiStreamLoader> {
    Ok(MultiStreamLoader::from_config(
        &config.pipeline,
        paths,
        label_map.clone(),
        Arc::clone(transform),
    )?)
}

pub fn run(config: AppConfig) -> Result<()> {
    config.validate()?;
    let label_map = config.label_map()?;
    let gestures: Vec<&str> = label_map.iter().map(|(name, _)| name).collect();

    let samples = discover_samples(&config.data_dir, &gestures)?;
    if samples.is_empty() {
        warn!("no samples found under {}", config.data_dir.display());
    }
    let (train, test) = train_test_split(samples, config.test_fraction, config.split_seed);
    info!(
        train = train.len(),
        test = test.len(),
        classes = label_map.num_classes(),
        "dataset split"
    );

    let transform = build_transform(&config)?;
    let mut train_loader = build_loader(&config, train, &label_map, &transform)?;
    let mut test_loader = build_loader(&config, test, &label_map, &transform)?;

    for epoch in 1..=config.epochs {
        info!(epoch, "epoch {}/{}", epoch, config.epochs);
        run_pass(&mut train_loader, "train", config.max_batches)?;
        if config.validate_each_epoch > 0 && epoch % config.validate_each_epoch == 0 {
            run_pass(&mut test_loader, "validation", config.max_batches)?;
        }
    }
    Ok(())
}
