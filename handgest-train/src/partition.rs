//! Splitting the global batch across worker datasets.

use crate::config::PipelineConfig;
use crate::dataset::GestureDataset;
use crate::error::{PipelineError, Result};
use crate::stream::StreamContext;
use crate::transform::FrameTransform;
use handgest_data::LabelMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// How a global batch is divided between workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPartition {
    pub num_workers: usize,
    pub per_worker_batch_size: usize,
}

impl WorkerPartition {
    /// Use the largest divisor of `batch_size` in `[2, max_workers]`, or a
    /// single worker when there is none.
    pub fn plan(batch_size: usize, max_workers: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(PipelineError::Configuration("batch size must be positive".into()));
        }
        let max_workers = max_workers.max(1);
        let num_workers = (2..=max_workers.min(batch_size))
            .rev()
            .find(|n| batch_size % n == 0)
            .unwrap_or(1);
        Ok(Self {
            num_workers,
            per_worker_batch_size: batch_size / num_workers,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.num_workers * self.per_worker_batch_size
    }
}

/// Build one [`GestureDataset`] per worker, all over the full sample list.
pub fn split_datasets(
    config: &PipelineConfig,
    paths: Vec<PathBuf>,
    label_map: LabelMap,
    transform: Arc<dyn FrameTransform>,
) -> Result<Vec<GestureDataset>> {
    let partition = WorkerPartition::plan(config.batch_size, config.max_workers)?;
    let context = Arc::new(StreamContext::new(
        label_map,
        transform,
        config.frame_rate()?,
        config.data_type,
    ));
    let paths: Arc<[PathBuf]> = paths.into();

    info!(
        batch_size = config.batch_size,
        workers = partition.num_workers,
        per_worker = partition.per_worker_batch_size,
        samples = paths.len(),
        "partitioned batch"
    );

    Ok((0..partition.num_workers)
        .map(|worker| {
            GestureDataset::new(
                Arc::clone(&paths),
                Arc::clone(&context),
                partition.per_worker_batch_size,
            )
            .with_worker(worker)
            .with_seed(config.seed)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::IndexTransform;

    fn plan(batch_size: usize, max_workers: usize) -> (usize, usize) {
        let p = WorkerPartition::plan(batch_size, max_workers).unwrap();
        (p.num_workers, p.per_worker_batch_size)
    }

    #[test]
    fn test_largest_divisor_wins() {
        assert_eq!(plan(8, 4), (4, 2));
        assert_eq!(plan(6, 4), (3, 2));
        assert_eq!(plan(12, 5), (4, 3));
        assert_eq!(plan(4, 8), (4, 1));
    }

    #[test]
    fn test_falls_back_to_single_worker() {
        assert_eq!(plan(7, 4), (1, 7));
        assert_eq!(plan(1, 4), (1, 1));
        assert_eq!(plan(9, 2), (1, 9));
        assert_eq!(plan(6, 1), (1, 6));
        assert_eq!(plan(6, 0), (1, 6));
    }

    #[test]
    fn test_product_is_batch_size() {
        for batch_size in 1..=64 {
            for max_workers in 0..=16 {
                let p = WorkerPartition::plan(batch_size, max_workers).unwrap();
                assert_eq!(p.batch_size(), batch_size);
                assert!(p.num_workers <= max_workers.max(1));
            }
        }
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(matches!(
            WorkerPartition::plan(0, 4),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_split_datasets_shapes() {
        let config = PipelineConfig::default().batch_size(6).max_workers(4).seed(3);
        let paths = vec![PathBuf::from("a"), PathBuf::from("b")];
        let map = LabelMap::from_gestures(&["select"]).unwrap();

        let datasets = split_datasets(&config, paths, map, Arc::new(IndexTransform)).unwrap();
        assert_eq!(datasets.len(), 3);
        for (i, dataset) in datasets.iter().enumerate() {
            assert_eq!(dataset.worker(), i);
            assert_eq!(dataset.batch_size(), 2);
            assert_eq!(dataset.paths().len(), 2);
            assert_eq!(dataset.frame_shape(), [1, 1, 3]);
        }
    }

    #[test]
    fn test_split_datasets_rejects_bad_rate() {
        let config = PipelineConfig::default().target_fps(0);
        let map = LabelMap::from_gestures(&["select"]).unwrap();
        let err = split_datasets(&config, Vec::new(), map, Arc::new(IndexTransform)).err().unwrap();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
