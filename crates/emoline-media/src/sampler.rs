//! Frame sampling for the live analyzer.
//!
//! Classifier calls dominate runtime, so only every `stride`-th decoded
//! frame is submitted. Frame indices are 0-based in decode order.

use crate::error::{MediaError, MediaResult};

/// Default sampling stride.
pub const DEFAULT_SAMPLE_STRIDE: u64 = 5;

/// Decides which frames go to the classifier and where they sit in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSampler {
    stride: u64,
    fps: f64,
}

impl FrameSampler {
    /// Create a sampler for a stream at `fps` sampling every `stride` frames.
    pub fn new(stride: u64, fps: f64) -> MediaResult<Self> {
        if stride == 0 {
            return Err(MediaError::InvalidStride);
        }
        validate_fps(fps)?;
        Ok(Self { stride, fps })
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Whether `frame_index` should be classified.
    pub fn should_sample(&self, frame_index: u64) -> bool {
        should_sample(frame_index, self.stride)
    }

    /// Presentation time of `frame_index` in seconds.
    pub fn seconds_at(&self, frame_index: u64) -> f64 {
        frame_index as f64 / self.fps
    }
}

/// `frame_index mod stride == 0`. A zero stride never samples.
pub fn should_sample(frame_index: u64, stride: u64) -> bool {
    stride >= 1 && frame_index % stride == 0
}

/// Convert a frame index to seconds at `fps`.
pub fn frame_index_to_seconds(frame_index: u64, fps: f64) -> MediaResult<f64> {
    validate_fps(fps)?;
    Ok(frame_index as f64 / fps)
}

fn validate_fps(fps: f64) -> MediaResult<()> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(MediaError::InvalidFrameRate(fps));
    }
    Ok(())
}
