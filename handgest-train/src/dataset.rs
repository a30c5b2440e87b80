//! One worker's share of the global batch.

use crate::error::Result;
use crate::stream::{Emission, SlotStream, StreamContext};
use crate::zip::ZipShortest;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// A set of `batch_size` slots iterated in lock-step.
///
/// Every slot walks its own permutation of the full sample list. Slots are
/// numbered globally (`worker * batch_size + slot`) so that transforms and
/// shuffles see the same slot identity however the batch is partitioned.
#[derive(Clone)]
pub struct GestureDataset {
    paths: Arc<[PathBuf]>,
    context: Arc<StreamContext>,
    batch_size: usize,
    worker: usize,
    seed: Option<u64>,
}

impl GestureDataset {
    pub fn new(
        paths: impl Into<Arc<[PathBuf]>>,
        context: Arc<StreamContext>,
        batch_size: usize,
    ) -> Self {
        Self {
            paths: paths.into(),
            context,
            batch_size,
            worker: 0,
            seed: None,
        }
    }

    /// Position of this dataset among the loader's workers.
    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = worker;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn worker(&self) -> usize {
        self.worker
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn frame_shape(&self) -> [usize; 3] {
        self.context.transform.frame_shape()
    }

    fn global_slot(&self, slot: usize) -> usize {
        self.worker * self.batch_size + slot
    }

    fn slot_rng(&self, epoch: u64, global_slot: usize) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(
                seed.wrapping_add(epoch << 32).wrapping_add(global_slot as u64),
            ),
            None => StdRng::from_entropy(),
        }
    }

    /// Fresh slot streams for one epoch, zipped shortest-first.
    ///
    /// Each call reshuffles every slot independently.
    pub fn streams(&self, epoch: u64) -> ZipShortest<SlotStream> {
        let slots = (0..self.batch_size)
            .map(|slot| {
                let global = self.global_slot(slot);
                let mut order = self.paths.to_vec();
                order.shuffle(&mut self.slot_rng(epoch, global));
                SlotStream::new(global, order, Arc::clone(&self.context))
            })
            .collect();
        debug!(
            worker = self.worker,
            epoch,
            slots = self.batch_size,
            samples = self.paths.len(),
            "dataset streams ready"
        );
        ZipShortest::new(slots)
    }

    /// One item per step: the step's emissions in slot order, or the first
    /// error any slot hit at that step.
    pub fn steps(&self, epoch: u64) -> impl Iterator<Item = Result<Vec<Emission>>> + Send + use<> {
        self.streams(epoch).map(|step| step.into_iter().collect::<Result<Vec<_>>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::test_support::{IndexTransform, SampleTree, decode};
    use crate::resample::FrameRate;
    use handgest_data::{DataError, DataType, LabelMap};

    fn context(target_fps: u32) -> Arc<StreamContext> {
        Arc::new(StreamContext::new(
            LabelMap::from_gestures(&["select", "high"]).unwrap(),
            Arc::new(IndexTransform),
            FrameRate::new(30, target_fps).unwrap(),
            DataType::Pcd,
        ))
    }

    /// Sample numbers in the order a slot visits them.
    fn slot_orders(dataset: &GestureDataset, epoch: u64) -> Vec<Vec<usize>> {
        let mut orders = vec![Vec::new(); dataset.batch_size()];
        for step in dataset.steps(epoch) {
            for (slot, emission) in step.unwrap().iter().enumerate() {
                let (_, sample, _) = decode(&emission.frame);
                if orders[slot].last() != Some(&sample) {
                    orders[slot].push(sample);
                }
            }
        }
        orders
    }

    #[test]
    fn test_every_slot_sees_every_sample() {
        let tree = SampleTree::new();
        let paths: Vec<_> = (0..6)
            .map(|i| tree.sample("select", &format!("s{i}"), 2, "0 0"))
            .collect();
        let dataset = GestureDataset::new(paths, context(30), 3).with_seed(Some(11));

        let orders = slot_orders(&dataset, 0);
        assert_eq!(orders.len(), 3);
        for order in &orders {
            let mut sorted = order.clone();
            sorted.sort();
            assert_eq!(sorted, (0..6).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_slots_shuffle_independently() {
        let tree = SampleTree::new();
        let paths: Vec<_> = (0..8)
            .map(|i| tree.sample("high", &format!("s{i}"), 1, "0 0"))
            .collect();
        let dataset = GestureDataset::new(paths, context(30), 4).with_seed(Some(5));

        let orders = slot_orders(&dataset, 0);
        assert!(orders.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_seeded_epochs_are_reproducible_and_distinct() {
        let tree = SampleTree::new();
        let paths: Vec<_> = (0..8)
            .map(|i| tree.sample("high", &format!("s{i}"), 1, "0 0"))
            .collect();
        let dataset = GestureDataset::new(paths, context(30), 2).with_seed(Some(5));

        assert_eq!(slot_orders(&dataset, 0), slot_orders(&dataset, 0));
        assert_ne!(slot_orders(&dataset, 0), slot_orders(&dataset, 1));
    }

    #[test]
    fn test_step_count_and_slot_indices() {
        let tree = SampleTree::new();
        let paths = vec![
            tree.sample("select", "s0", 10, "2 4"),
            tree.sample("select", "s1", 12, "0 11"),
        ];
        // 30 -> 5: s0 emits 2 frames, s1 emits 2 frames.
        let dataset = GestureDataset::new(paths, context(5), 2).with_worker(3).with_seed(Some(1));
        let steps: Vec<_> = dataset.steps(0).map(Result::unwrap).collect();

        assert_eq!(steps.len(), 4);
        for step in &steps {
            assert_eq!(step.len(), 2);
            let slots: Vec<usize> = step.iter().map(|e| decode(&e.frame).2).collect();
            assert_eq!(slots, vec![6, 7]);
        }
    }

    #[test]
    fn test_labels_follow_intervals() {
        let tree = SampleTree::new();
        let paths = vec![tree.sample("high", "s0", 6, "1 3")];
        let dataset = GestureDataset::new(paths, context(30), 1);
        let labels: Vec<i64> = dataset.steps(0).map(|s| s.unwrap()[0].label).collect();
        assert_eq!(labels, vec![0, 2, 2, 2, 0, 0]);
    }

    #[test]
    fn test_empty_path_list_yields_no_steps() {
        let dataset = GestureDataset::new(Vec::<PathBuf>::new(), context(30), 2);
        assert_eq!(dataset.steps(0).count(), 0);
    }

    #[test]
    fn test_error_surfaces_as_step() {
        let tree = SampleTree::new();
        let paths = vec![tree.sample("wave", "s0", 3, "0 0")];
        let dataset = GestureDataset::new(paths, context(30), 2);
        let mut steps = dataset.steps(0);
        let err = steps.next().unwrap().unwrap_err();
        assert!(matches!(err, PipelineError::Data(DataError::UnknownGesture { .. })));
    }

    #[test]
    fn test_batches_stay_full_with_uneven_samples() {
        let tree = SampleTree::new();
        let paths: Vec<_> = (0..5)
            .map(|i| tree.sample("select", &format!("s{i}"), 3 + i, "0 0"))
            .collect();
        let dataset = GestureDataset::new(paths, context(30), 3).with_seed(Some(2));
        let widths: Vec<usize> = dataset.streams(0).map(|step| step.len()).collect();
        // 3 + 4 + 5 + 6 + 7 frames, visited by every slot.
        assert_eq!(widths.len(), 25);
        assert!(widths.iter().all(|&n| n == 3));
    }
}
