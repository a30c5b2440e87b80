//! Gesture labels: the `label.txt` interval and the gesture → class id map.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

/// Integer class id as consumed by the loss (`0` is background).
pub type ClassId = i64;

/// Reserved gesture name for background frames.
pub const NO_GESTURE: &str = "no_gesture";

/// Name of the per-sample label file.
pub const LABEL_FILE: &str = "label.txt";

/// Inclusive frame interval over which the gesture is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelInterval {
    pub start: i64,
    pub finish: i64,
}

impl LabelInterval {
    pub fn new(start: i64, finish: i64) -> Self {
        Self { start, finish }
    }

    /// Read the interval from `<sample_dir>/label.txt`.
    ///
    /// Only the first line is considered; it must hold exactly two
    /// whitespace-separated integers.
    #[tracing::instrument(skip_all, fields(sample = %sample_dir.display()))]
    pub fn read(sample_dir: &Path) -> Result<Self> {
        let path = sample_dir.join(LABEL_FILE);
        let file = File::open(&path).map_err(|source| DataError::MissingLabelFile {
            path: path.clone(),
            source,
        })?;

        let mut line = String::new();
        BufReader::new(file).read_line(&mut line)?;

        let interval = Self::parse(&line).map_err(|reason| DataError::MalformedLabelFile {
            path: path.clone(),
            reason,
        })?;
        if interval.start > interval.finish {
            warn!(
                "label interval {}..={} in {} is empty",
                interval.start,
                interval.finish,
                path.display()
            );
        }
        Ok(interval)
    }

    fn parse(line: &str) -> std::result::Result<Self, String> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => Err("empty label line".to_string()),
            [start, finish] => {
                let start = start
                    .parse::<i64>()
                    .map_err(|e| format!("invalid start '{}': {}", start, e))?;
                let finish = finish
                    .parse::<i64>()
                    .map_err(|e| format!("invalid finish '{}': {}", finish, e))?;
                Ok(Self { start, finish })
            }
            other => Err(format!("expected 2 integers, found {} tokens", other.len())),
        }
    }

    /// Whether frame `index` lies inside the interval (both ends inclusive).
    pub fn contains(&self, index: usize) -> bool {
        let index = index as i64;
        self.start <= index && index <= self.finish
    }
}

/// Name of the gesture a sample belongs to: its grandparent directory.
pub fn gesture_name(sample_dir: &Path) -> Result<&str> {
    sample_dir
        .parent()
        .and_then(Path::parent)
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .ok_or_else(|| DataError::MissingGestureName(sample_dir.to_path_buf()))
}

/// Mapping from gesture name to class id.
///
/// Always contains `no_gesture -> 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, ClassId>", into = "BTreeMap<String, ClassId>")]
pub struct LabelMap {
    classes: BTreeMap<String, ClassId>,
}

impl LabelMap {
    /// Validate and wrap an explicit mapping.
    pub fn new(classes: BTreeMap<String, ClassId>) -> Result<Self> {
        match classes.get(NO_GESTURE) {
            Some(0) => {}
            Some(id) => {
                return Err(DataError::InvalidLabelMap(format!(
                    "'{}' must map to 0, got {}",
                    NO_GESTURE, id
                )));
            }
            None => {
                return Err(DataError::InvalidLabelMap(format!(
                    "missing '{}' entry",
                    NO_GESTURE
                )));
            }
        }
        if let Some((name, id)) = classes
            .iter()
            .find(|(name, id)| **id <= 0 && *name != NO_GESTURE)
        {
            return Err(DataError::InvalidLabelMap(format!(
                "gesture '{}' has non-positive class id {}",
                name, id
            )));
        }
        Ok(Self { classes })
    }

    /// Build the map from an ordered gesture list, ids starting at 1.
    pub fn from_gestures<S: AsRef<str>>(gestures: &[S]) -> Result<Self> {
        let mut classes: BTreeMap<String, ClassId> = gestures
            .iter()
            .zip(1..)
            .map(|(gesture, id)| (gesture.as_ref().to_string(), id))
            .collect();
        classes.insert(NO_GESTURE.to_string(), 0);
        Self::new(classes)
    }

    /// Load a JSON object `{"gesture": id, ...}`.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let classes: BTreeMap<String, ClassId> = serde_json::from_reader(reader)?;
        Self::new(classes)
    }

    /// Class id of `gesture`; `sample` is only used for error context.
    pub fn class_id(&self, gesture: &str, sample: &Path) -> Result<ClassId> {
        self.classes
            .get(gesture)
            .copied()
            .ok_or_else(|| DataError::UnknownGesture {
                gesture: gesture.to_string(),
                path: sample.to_path_buf(),
            })
    }

    pub fn get(&self, gesture: &str) -> Option<ClassId> {
        self.classes.get(gesture).copied()
    }

    /// Number of classes including background.
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ClassId)> {
        self.classes.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

impl TryFrom<BTreeMap<String, ClassId>> for LabelMap {
    type Error = DataError;

    fn try_from(classes: BTreeMap<String, ClassId>) -> Result<Self> {
        Self::new(classes)
    }
}

impl From<LabelMap> for BTreeMap<String, ClassId> {
    fn from(map: LabelMap) -> Self {
        map.classes
    }
}
