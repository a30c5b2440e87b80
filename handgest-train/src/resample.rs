//! Frame-rate resampling with a fixed-point accumulator.
//!
//! Native frames arrive at `base_fps`; the accumulator decides how many times
//! each one is emitted so that the output approximates `target_fps` without
//! drift. Frames are dropped when downsampling and repeated when upsampling.

use crate::error::{PipelineError, Result};
use std::iter::Enumerate;

/// A validated `(base_fps, target_fps)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRate {
    base_fps: u32,
    target_fps: u32,
}

impl FrameRate {
    /// Both rates must be non-zero.
    pub fn new(base_fps: u32, target_fps: u32) -> Result<Self> {
        if base_fps == 0 || target_fps == 0 {
            return Err(PipelineError::Configuration(format!(
                "frame rates must be positive (base {}, target {})",
                base_fps, target_fps
            )));
        }
        Ok(Self {
            base_fps,
            target_fps,
        })
    }

    pub fn base_fps(&self) -> u32 {
        self.base_fps
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }
}

/// Per-sequence accumulator in units of native-frame ticks.
#[derive(Debug, Clone)]
pub struct Accumulator {
    rate: FrameRate,
    current: u64,
}

impl Accumulator {
    /// Seeded at `max(0, base_fps - target_fps)` so the first native frame is
    /// always emitted.
    pub fn new(rate: FrameRate) -> Self {
        Self {
            rate,
            current: rate.base_fps.saturating_sub(rate.target_fps) as u64,
        }
    }

    /// Consume one native frame; returns how many times it is emitted.
    pub fn advance(&mut self) -> u32 {
        let base = self.rate.base_fps as u64;
        self.current += self.rate.target_fps as u64;
        // Same result as repeatedly subtracting `base` while `current >= base`.
        let emissions = self.current / base;
        self.current -= emissions * base;
        emissions as u32
    }
}

/// Iterator adapter yielding `(native_index, frame)` once per emission.
pub struct Resample<I: Iterator> {
    frames: Enumerate<I>,
    accumulator: Accumulator,
    pending: Option<(usize, I::Item)>,
    remaining: u32,
}

impl<I> Resample<I>
where
    I: Iterator,
    I::Item: Clone,
{
    pub fn new(frames: I, rate: FrameRate) -> Self {
        Self {
            frames: frames.enumerate(),
            accumulator: Accumulator::new(rate),
            pending: None,
            remaining: 0,
        }
    }
}

impl<I> Iterator for Resample<I>
where
    I: Iterator,
    I::Item: Clone,
{
    type Item = (usize, I::Item);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.remaining > 0 {
                self.remaining -= 1;
                return if self.remaining == 0 {
                    self.pending.take()
                } else {
                    self.pending.clone()
                };
            }
            let (index, frame) = self.frames.next()?;
            self.remaining = self.accumulator.advance();
            self.pending = Some((index, frame));
        }
    }
}

/// Extension trait adding `.resample(rate)` to any iterator of cloneable frames.
pub trait ResampleExt: Iterator + Sized
where
    Self::Item: Clone,
{
    fn resample(self, rate: FrameRate) -> Resample<Self> {
        Resample::new(self, rate)
    }
}

impl<I> ResampleExt for I
where
    I: Iterator,
    I::Item: Clone,
{
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitted_indices(n: usize, base: u32, target: u32) -> Vec<usize> {
        let rate = FrameRate::new(base, target).unwrap();
        (0..n).resample(rate).map(|(index, _)| index).collect()
    }

    #[test]
    fn test_equal_rates_emit_every_frame_once() {
        for n in 0..50 {
            for fps in [1, 15, 30, 60] {
                assert_eq!(emitted_indices(n, fps, fps), (0..n).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn test_downsample_trace_30_to_5() {
        assert_eq!(emitted_indices(10, 30, 5), vec![0, 6]);
        assert_eq!(emitted_indices(13, 30, 5), vec![0, 6, 12]);
    }

    #[test]
    fn test_downsample_is_monotonic_and_drift_free() {
        for base in 1..=60u32 {
            for target in 1..base {
                let rate = FrameRate::new(base, target).unwrap();
                let mut acc = Accumulator::new(rate);
                let mut emitted = 0u64;
                for k in 1..=200u64 {
                    let count = acc.advance();
                    assert!(count <= 1, "downsampling never repeats a frame");
                    emitted += count as u64;
                    let ideal = (k as f64 * target as f64 / base as f64).round() as i64;
                    assert!(
                        (emitted as i64 - ideal).abs() <= 1,
                        "base {} target {} k {}: emitted {} ideal {}",
                        base,
                        target,
                        k,
                        emitted,
                        ideal
                    );
                }

                let indices = emitted_indices(200, base, target);
                assert!(indices.len() <= 200);
                assert!(indices.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn test_upsample_repeats_frames() {
        let indices = emitted_indices(10, 30, 60);
        assert_eq!(indices.len(), 20);
        assert_eq!(&indices[..4], &[0, 0, 1, 1]);

        let indices = emitted_indices(9, 20, 30);
        assert!(indices.len() >= 9);
        assert!(indices.windows(2).any(|w| w[0] == w[1]));
        assert!(indices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_repeated_frames_are_cloned_values() {
        let rate = FrameRate::new(10, 30).unwrap();
        let out: Vec<_> = vec!["a".to_string(), "b".to_string()]
            .into_iter()
            .resample(rate)
            .collect();
        let names: Vec<&str> = out.iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(names, ["a", "a", "a", "b", "b", "b"]);
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(matches!(FrameRate::new(0, 5), Err(PipelineError::Configuration(_))));
        assert!(matches!(FrameRate::new(30, 0), Err(PipelineError::Configuration(_))));
    }
}
