//! Emotion timeline construction and FFmpeg rendering.
//!
//! This crate provides:
//! - Frame sampling and live per-frame analysis against an [`EmotionClassifier`]
//! - Timeline accumulation, time-series export and PNG charts
//! - Containment join of emotion and sentiment segments
//! - Overlay composition and single-pass `drawtext` rendering
//! - Atomic output finalization

pub mod chart;
pub mod classifier;
pub mod command;
pub mod compositor;
pub mod error;
pub mod filters;
pub mod frames;
pub mod fs_utils;
pub mod merge;
pub mod metrics;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod sampler;
pub mod timeline;

pub use chart::{ChartConfig, TimelineChartExporter};
pub use classifier::EmotionClassifier;
pub use command::{FfmpegCommand, FfmpegRunner};
pub use compositor::{OverlayCompositor, OverlayLayout};
pub use error::{MediaError, MediaResult};
pub use filters::TextStyle;
pub use frames::{FrameReader, FrameSource, MemoryFrameSource};
pub use fs_utils::{write_atomic, PendingOutput};
pub use merge::{JoinStrategy, MergedSegment, SegmentMerger};
pub use pipeline::{
    annotated_output_path, LiveAnalyzer, LiveOutcome, LiveStats, OverlayRenderer, RenderSettings,
    SegmentPipeline, SegmentPlan,
};
pub use probe::{probe_video, VideoInfo};
pub use progress::RenderProgress;
pub use sampler::{frame_index_to_seconds, should_sample, FrameSampler, DEFAULT_SAMPLE_STRIDE};
pub use timeline::{TimeSeries, TimeSeriesRow, Timeline, TimelineBuilder};
