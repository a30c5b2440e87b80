//! Sample discovery: frame listing, dataset globbing and train/test splits.

use crate::error::{DataError, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Kind of per-frame file stored in a sample folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Point clouds (`*.pcd`).
    Pcd,
    /// Proxy images (`*.jpg`).
    Proxy,
}

impl DataType {
    /// File extension of frames of this kind.
    pub fn extension(self) -> &'static str {
        match self {
            DataType::Pcd => "pcd",
            DataType::Proxy => "jpg",
        }
    }
}

impl FromStr for DataType {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pcd" => Ok(DataType::Pcd),
            "proxy" => Ok(DataType::Proxy),
            other => Err(DataError::UnsupportedDataType(other.to_string())),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Pcd => write!(f, "pcd"),
            DataType::Proxy => write!(f, "proxy"),
        }
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !is_hidden(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

/// Frame files of a sample folder, sorted lexicographically.
///
/// The position in the returned list is the frame index used by `label.txt`.
pub fn list_frames(sample_dir: &Path, data_type: DataType) -> Result<Vec<PathBuf>> {
    let extension = data_type.extension();
    let frames: Vec<PathBuf> = sorted_entries(sample_dir)?
        .into_iter()
        .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some(extension))
        .collect();
    debug!("{} {} frames in {}", frames.len(), data_type, sample_dir.display());
    Ok(frames)
}

/// Collect sample folders laid out as `<root>/G*/<gesture>/<a>/<b>`.
///
/// Only gestures listed in `gestures` are kept. The result is sorted.
#[tracing::instrument(skip_all, fields(root = %root.display()))]
pub fn discover_samples<S: AsRef<str>>(root: &Path, gestures: &[S]) -> Result<Vec<PathBuf>> {
    let mut samples = Vec::new();
    for group in sorted_entries(root)? {
        let is_group = group.is_dir()
            && group
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('G'));
        if !is_group {
            continue;
        }
        for gesture_dir in sorted_entries(&group)? {
            let Some(gesture) = gesture_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !gesture_dir.is_dir() || !gestures.iter().any(|g| g.as_ref() == gesture) {
                continue;
            }
            for session in sorted_entries(&gesture_dir)?.into_iter().filter(|p| p.is_dir()) {
                samples.extend(sorted_entries(&session)?.into_iter().filter(|p| p.is_dir()));
            }
        }
    }
    samples.sort();
    debug!("discovered {} samples", samples.len());
    Ok(samples)
}

/// Shuffle `paths` with `seed` and split off `floor(test_fraction * n)` test samples.
///
/// Returns `(train, test)`. `test_fraction` is clamped to `[0, 1]`.
pub fn train_test_split(
    mut paths: Vec<PathBuf>,
    test_fraction: f64,
    seed: u64,
) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut rng = StdRng::seed_from_u64(seed);
    paths.shuffle(&mut rng);

    let test_len = (test_fraction.clamp(0.0, 1.0) * paths.len() as f64).floor() as usize;
    let test = paths.split_off(paths.len() - test_len);
    (paths, test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    #[test]
    fn test_data_type_parsing() {
        assert_eq!("pcd".parse::<DataType>().unwrap(), DataType::Pcd);
        assert_eq!("proxy".parse::<DataType>().unwrap(), DataType::Proxy);
        assert!(matches!(
            "png".parse::<DataType>(),
            Err(DataError::UnsupportedDataType(ref s)) if s == "png"
        ));
    }

    #[test]
    fn test_data_type_serde_names() {
        assert_eq!(serde_json::to_string(&DataType::Proxy).unwrap(), "\"proxy\"");
        let parsed: DataType = serde_json::from_str("\"pcd\"").unwrap();
        assert_eq!(parsed, DataType::Pcd);
    }

    #[test]
    fn test_list_frames_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["0002.pcd", "0000.pcd", "0001.pcd", "0000.jpg", "label.txt", ".0003.pcd"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.pcd")).unwrap();

        let frames = list_frames(dir.path(), DataType::Pcd).unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["0000.pcd", "0001.pcd", "0002.pcd"]);

        let images = list_frames(dir.path(), DataType::Proxy).unwrap();
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn test_list_frames_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_frames(dir.path(), DataType::Pcd).unwrap().is_empty());
    }

    #[test]
    fn test_discover_samples_filters_gestures() {
        let root = tempfile::tempdir().unwrap();
        for rel in [
            "G01/select/s1/t1",
            "G01/select/s1/t2",
            "G02/select/s2/t1",
            "G02/high/s1/t1",
            "misc/select/s1/t1",
        ] {
            fs::create_dir_all(root.path().join(rel)).unwrap();
        }
        fs::write(root.path().join("G01/select/s1/notes.txt"), b"").unwrap();

        let samples = discover_samples(root.path(), &["select"]).unwrap();
        let expected: Vec<PathBuf> = ["G01/select/s1/t1", "G01/select/s1/t2", "G02/select/s2/t1"]
            .iter()
            .map(|rel| root.path().join(rel))
            .collect();
        assert_eq!(samples, expected);
    }

    #[test]
    fn test_train_test_split_partitions_paths() {
        let paths: Vec<PathBuf> = (0..10).map(|i| PathBuf::from(format!("s{i}"))).collect();
        let (train, test) = train_test_split(paths.clone(), 0.25, 7);
        assert_eq!(test.len(), 2);
        assert_eq!(train.len(), 8);

        let all: HashSet<_> = train.iter().chain(test.iter()).cloned().collect();
        assert_eq!(all, paths.into_iter().collect::<HashSet<_>>());
    }

    #[test]
    fn test_train_test_split_is_seeded() {
        let paths: Vec<PathBuf> = (0..20).map(|i| PathBuf::from(format!("s{i}"))).collect();
        assert_eq!(
            train_test_split(paths.clone(), 0.5, 3),
            train_test_split(paths, 0.5, 3)
        );
    }
}
