//! Live and segment pipelines.
//!
//! | Pipeline | Input | Produces |
//! |----------|-------|----------|
//! | `LiveAnalyzer` | decoded frames + classifier | [`Timeline`](crate::timeline::Timeline) |
//! | `SegmentPipeline` | segment-analysis JSON | merged overlay directives |
//!
//! Both feed [`OverlayRenderer`], which draws the directives onto the source
//! video in a single FFmpeg pass.

pub mod live;
pub mod render;
pub mod segments;

pub use live::{LiveAnalyzer, LiveOutcome, LiveStats};
pub use render::{OverlayRenderer, RenderSettings};
pub use segments::{annotated_output_path, SegmentPipeline, SegmentPlan};
