//! Multi-worker batch assembly.
//!
//! Each [`GestureDataset`] runs on its own thread and sends one item per
//! step over a bounded channel. The assembler receives from every worker in
//! lock-step, concatenates the parts in worker order and stacks them into a
//! dense `[n, C, H, W]` tensor with an `i64` label vector.

use crate::config::PipelineConfig;
use crate::dataset::GestureDataset;
use crate::error::{PipelineError, Result};
use crate::partition::split_datasets;
use crate::stream::Emission;
use crate::transform::FrameTransform;
use crate::zip::ZipShortest;
use handgest_data::{ClassId, LabelMap};
use ndarray::{Array1, Array4, Axis};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

type Step = Result<Vec<Emission>>;

/// One assembled training batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// `[n, C, H, W]`
    pub samples: Array4<f32>,
    /// `[n]`
    pub labels: Array1<ClassId>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Drives a set of worker datasets and yields assembled batches.
pub struct MultiStreamLoader {
    datasets: Vec<GestureDataset>,
    frame_shape: [usize; 3],
    prefetch: usize,
    epoch: u64,
}

impl MultiStreamLoader {
    pub fn new(datasets: Vec<GestureDataset>, frame_shape: [usize; 3]) -> Self {
        Self {
            datasets,
            frame_shape,
            prefetch: 2,
            epoch: 0,
        }
    }

    /// Steps each worker may buffer ahead of the assembler.
    pub fn prefetch(mut self, steps: usize) -> Self {
        self.prefetch = steps;
        self
    }

    /// Partition the batch per `config` and build the loader in one go.
    pub fn from_config(
        config: &PipelineConfig,
        paths: Vec<PathBuf>,
        label_map: LabelMap,
        transform: Arc<dyn FrameTransform>,
    ) -> Result<Self> {
        let frame_shape = transform.frame_shape();
        let datasets = split_datasets(config, paths, label_map, transform)?;
        Ok(Self::new(datasets, frame_shape).prefetch(config.prefetch))
    }

    pub fn num_workers(&self) -> usize {
        self.datasets.len()
    }

    pub fn batch_size(&self) -> usize {
        self.datasets.iter().map(GestureDataset::batch_size).sum()
    }

    /// Epochs started so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn frame_shape(&self) -> [usize; 3] {
        self.frame_shape
    }

    /// Start one epoch.
    ///
    /// Spawns a thread per dataset. Iteration ends when the first worker
    /// runs out; the first error is yielded once and then iteration ends.
    /// Dropping the iterator disconnects and joins every worker.
    pub fn iter(&mut self) -> BatchIter {
        let epoch = self.epoch;
        self.epoch += 1;

        let mut receivers = Vec::with_capacity(self.datasets.len());
        let mut handles = Vec::with_capacity(self.datasets.len());
        for dataset in &self.datasets {
            let (tx, rx) = mpsc::sync_channel::<Step>(self.prefetch);
            let worker = dataset.worker();
            let steps = dataset.steps(epoch);

            let handle = thread::spawn(move || {
                let mut sent = 0usize;
                for step in steps {
                    let failed = step.is_err();
                    // Receiver gone: the assembler stopped early.
                    if tx.send(step).is_err() {
                        break;
                    }
                    sent += 1;
                    if failed {
                        break;
                    }
                }
                debug!(worker, steps = sent, "worker finished");
            });
            receivers.push(rx.into_iter());
            handles.push((worker, handle));
        }

        info!(
            epoch,
            workers = self.datasets.len(),
            batch_size = self.batch_size(),
            prefetch = self.prefetch,
            "starting epoch"
        );

        BatchIter {
            steps: Some(ZipShortest::new(receivers)),
            handles,
            frame_shape: self.frame_shape,
            epoch,
            produced: 0,
        }
    }
}

/// Iterator over one epoch of batches.
pub struct BatchIter {
    steps: Option<ZipShortest<mpsc::IntoIter<Step>>>,
    handles: Vec<(usize, JoinHandle<()>)>,
    frame_shape: [usize; 3],
    epoch: u64,
    produced: usize,
}

impl BatchIter {
    /// Batches yielded so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    fn assemble(&self, parts: Vec<Step>) -> Result<Batch> {
        let mut emissions = Vec::new();
        for part in parts {
            emissions.extend(part?);
        }

        let [c, h, w] = self.frame_shape;
        let n = emissions.len();
        let mut samples = Array4::<f32>::zeros((n, c, h, w));
        let mut labels = Array1::<ClassId>::zeros(n);
        for (i, emission) in emissions.into_iter().enumerate() {
            if emission.frame.shape() != self.frame_shape.as_slice() {
                return Err(PipelineError::ShapeMismatch {
                    expected: self.frame_shape,
                    actual: emission.frame.shape().to_vec(),
                });
            }
            samples.index_axis_mut(Axis(0), i).assign(&emission.frame);
            labels[i] = emission.label;
        }
        Ok(Batch { samples, labels })
    }

    /// Disconnect and join every worker; returns the first that panicked.
    fn shutdown(&mut self) -> Option<usize> {
        self.steps = None;
        let mut panicked = None;
        for (worker, handle) in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!(worker, "worker thread panicked");
                panicked.get_or_insert(worker);
            }
        }
        panicked
    }
}

impl Iterator for BatchIter {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let step = self.steps.as_mut()?.next();
        match step {
            Some(parts) => {
                let batch = self.assemble(parts);
                match &batch {
                    Ok(_) => self.produced += 1,
                    Err(err) => {
                        warn!(epoch = self.epoch, batch = self.produced, "stopping epoch: {}", err);
                        self.shutdown();
                    }
                }
                Some(batch)
            }
            None => {
                let panicked = self.shutdown();
                info!(epoch = self.epoch, batches = self.produced, "epoch finished");
                panicked.map(|worker| Err(PipelineError::WorkerPanicked { worker }))
            }
        }
    }
}

impl Drop for BatchIter {
    fn drop(&mut self) {
        self.shutdown();
    }
}
