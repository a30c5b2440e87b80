//! Per-frame labels for one recorded sequence.

use crate::error::Result;
use handgest_data::{ClassId, LabelInterval, LabelMap, gesture_name};
use std::path::Path;

/// Gates a sample's gesture class by its active frame interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceLabeler {
    class_id: ClassId,
    interval: LabelInterval,
}

impl SequenceLabeler {
    pub fn new(class_id: ClassId, interval: LabelInterval) -> Self {
        Self { class_id, interval }
    }

    /// Resolve the gesture from the folder layout and read `label.txt`.
    pub fn for_sample(sample_dir: &Path, label_map: &LabelMap) -> Result<Self> {
        let gesture = gesture_name(sample_dir)?;
        let class_id = label_map.class_id(gesture, sample_dir)?;
        let interval = LabelInterval::read(sample_dir)?;
        Ok(Self::new(class_id, interval))
    }

    /// Class id inside the interval, background (`0`) outside.
    pub fn label_for(&self, frame_index: usize) -> ClassId {
        if self.interval.contains(frame_index) {
            self.class_id
        } else {
            0
        }
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }
}
