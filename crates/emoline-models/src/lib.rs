//! Shared data models for the emotion timeline.
//!
//! This crate provides Serde-serializable types for:
//! - `H:MM:SS.f` timestamp parsing and formatting
//! - Detection events from live classification or segment analysis
//! - Classifier result shapes and decoded frames
//! - Overlay directives consumed by the renderer

pub mod analysis;
pub mod classification;
pub mod detection;
pub mod error;
pub mod overlay;
pub mod timestamp;

// Re-export common types
pub use analysis::SegmentAnalysis;
pub use classification::{Classification, RasterFrame};
pub use detection::{
    confidence_from_fraction, confidence_from_percent, normalize_confidence, DetectionEvent,
    EventKind, FaceRegion, TimeInterval, DEFAULT_POINT_WIDTH_SECS,
};
pub use error::{ModelError, ModelResult};
pub use overlay::{BoxDirective, OverlayAnchor, OverlayDirective};
pub use timestamp::{format_timestamp, parse_timestamp};
