//! Lazy emission streams for single samples and for slots.

use crate::error::{PipelineError, Result};
use crate::labeler::SequenceLabeler;
use crate::resample::{FrameRate, Resample, ResampleExt};
use crate::transform::FrameTransform;
use handgest_data::{ClassId, DataType, LabelMap, list_frames};
use ndarray::Array3;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// One transformed frame and its label.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub frame: Array3<f32>,
    pub label: ClassId,
}

/// Everything a stream needs besides the sample path.
pub struct StreamContext {
    pub label_map: LabelMap,
    pub transform: Arc<dyn FrameTransform>,
    pub rate: FrameRate,
    pub data_type: DataType,
}

impl StreamContext {
    pub fn new(
        label_map: LabelMap,
        transform: Arc<dyn FrameTransform>,
        rate: FrameRate,
        data_type: DataType,
    ) -> Self {
        Self {
            label_map,
            transform,
            rate,
            data_type,
        }
    }
}

/// Emissions of one sample folder.
///
/// Reads `label.txt` and lists frames when opened; frames are transformed
/// lazily, once per emission, so a repeated frame is transformed again.
pub struct SequenceStream {
    slot: usize,
    labeler: SequenceLabeler,
    transform: Arc<dyn FrameTransform>,
    frames: Resample<std::vec::IntoIter<PathBuf>>,
}

impl SequenceStream {
    pub fn open(sample: &Path, slot: usize, context: &StreamContext) -> Result<Self> {
        let labeler = SequenceLabeler::for_sample(sample, &context.label_map)?;
        let frames = list_frames(sample, context.data_type)?;
        if frames.is_empty() {
            debug!(slot, "sample {} has no frames", sample.display());
        } else {
            debug!(slot, frames = frames.len(), "opened sample {}", sample.display());
        }
        Ok(Self {
            slot,
            labeler,
            transform: Arc::clone(&context.transform),
            frames: frames.into_iter().resample(context.rate),
        })
    }
}

impl Iterator for SequenceStream {
    type Item = Result<Emission>;

    fn next(&mut self) -> Option<Self::Item> {
        let (index, path) = self.frames.next()?;
        let label = self.labeler.label_for(index);
        Some(
            self.transform
                .apply(&path, self.slot)
                .map(|frame| Emission { frame, label })
                .map_err(|source| PipelineError::Transform { path, source }),
        )
    }
}

/// One slot: its own ordering of the samples, flattened end to end.
///
/// Samples are opened only when reached. The first error is yielded and the
/// stream then ends.
pub struct SlotStream {
    slot: usize,
    samples: std::vec::IntoIter<PathBuf>,
    current: Option<SequenceStream>,
    context: Arc<StreamContext>,
    failed: bool,
}

impl SlotStream {
    pub fn new(slot: usize, samples: Vec<PathBuf>, context: Arc<StreamContext>) -> Self {
        Self {
            slot,
            samples: samples.into_iter(),
            current: None,
            context,
            failed: false,
        }
    }

    fn fail(&mut self, err: PipelineError) -> Option<Result<Emission>> {
        self.failed = true;
        self.current = None;
        Some(Err(err))
    }
}

impl Iterator for SlotStream {
    type Item = Result<Emission>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(stream) = self.current.as_mut() {
                match stream.next() {
                    Some(Ok(emission)) => return Some(Ok(emission)),
                    Some(Err(err)) => return self.fail(err),
                    None => self.current = None,
                }
            }
            let sample = self.samples.next()?;
            match SequenceStream::open(&sample, self.slot, &self.context) {
                Ok(stream) => self.current = Some(stream),
                Err(err) => return self.fail(err),
            }
        }
    }
}
