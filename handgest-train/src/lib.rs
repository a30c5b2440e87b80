//! Handgest Training Pipeline
//!
//! Turns folders of variable-rate gesture recordings into fixed-rate,
//! labelled batches for a classifier training loop.
//!
//! ## Modules
//!
//! - [`resample`]: fixed-point frame-rate accumulator
//! - [`labeler`]: per-frame class labels from `label.txt`
//! - [`stream`]: per-sample and per-slot lazy emission streams
//! - [`dataset`]: one worker's set of interleaved slots
//! - [`partition`]: splitting the global batch across workers
//! - [`loader`]: lock-step multi-worker batch assembly
//! - [`transform`]: frame → tensor transforms

pub mod config;
pub mod dataset;
pub mod error;
pub mod labeler;
pub mod loader;
pub mod partition;
pub mod resample;
pub mod stream;
pub mod transform;
pub mod zip;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::PipelineConfig;
pub use dataset::GestureDataset;
pub use error::{PipelineError, TransformError};
pub use labeler::SequenceLabeler;
pub use loader::{Batch, BatchIter, MultiStreamLoader};
pub use partition::{WorkerPartition, split_datasets};
pub use resample::{Accumulator, FrameRate, Resample, ResampleExt};
pub use stream::{Emission, SequenceStream, SlotStream, StreamContext};
pub use transform::{FrameTransform, PointCloudProjection, ProxyImageTransform};
pub use zip::{ZipShortest, zip_shortest};
