//! Renderer-agnostic overlay instructions.

use serde::{Deserialize, Serialize};

use crate::detection::FaceRegion;

/// Where an overlay is anchored on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayAnchor {
    TopCenter,
    BottomCenter,
    /// Fixed pixel position of the text's top-left corner
    Pixel { x: i32, y: i32 },
}

/// Text to show at an anchor for a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayDirective {
    pub text: String,
    pub anchor: OverlayAnchor,
    /// Pixels away from the anchor edge, used to stack simultaneous overlays
    pub vertical_offset: u32,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

impl OverlayDirective {
    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.duration_seconds
    }
}

/// A face rectangle shown for a time window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxDirective {
    pub region: FaceRegion,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}
