//! Frame and classifier result shapes for the live pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::detection::{confidence_from_percent, DetectionEvent, FaceRegion, TimeInterval};
use crate::error::{ModelError, ModelResult};

/// A decoded RGB24 frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterFrame {
    /// 0-based decode index
    pub index: u64,
    pub width: u32,
    pub height: u32,
    /// Packed RGB24 pixels, row-major
    pub data: Vec<u8>,
}

impl RasterFrame {
    /// Byte length of one RGB24 frame at the given size.
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }
}

/// One face detection as returned by an emotion classifier.
///
/// Scores are on the classifier's 0..100 scale. The shape is validated when
/// it crosses into the crate; see [`Classification::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "emotion")]
    pub scores: BTreeMap<String, f64>,
    pub dominant_emotion: String,
    pub region: FaceRegion,
}

impl Classification {
    /// Check that the dominant label is scored and every score is in 0..100.
    pub fn validate(&self) -> ModelResult<()> {
        if self.scores.is_empty() {
            return Err(ModelError::InvalidClassification(
                "emotion mapping is empty".to_string(),
            ));
        }
        if !self.scores.contains_key(&self.dominant_emotion) {
            return Err(ModelError::InvalidClassification(format!(
                "dominant emotion '{}' has no score",
                self.dominant_emotion
            )));
        }
        for (label, value) in &self.scores {
            confidence_from_percent(*value).map_err(|_| {
                ModelError::InvalidClassification(format!("score for '{}' out of range: {}", label, value))
            })?;
        }
        Ok(())
    }

    /// Convert into a point-sample emotion event at `at` seconds.
    pub fn into_event(self, at: f64, point_width: f64) -> ModelResult<DetectionEvent> {
        self.validate()?;
        let scores = self
            .scores
            .into_iter()
            .map(|(label, value)| confidence_from_percent(value).map(|c| (label, c)))
            .collect::<ModelResult<BTreeMap<_, _>>>()?;
        let confidence = scores.get(&self.dominant_emotion).copied().ok_or_else(|| {
            ModelError::InvalidClassification(format!("dominant emotion '{}' has no score", self.dominant_emotion))
        })?;

        let mut event = DetectionEvent::from_scores(scores, TimeInterval::point(at, point_width)?, Some(self.region))?;
        // The classifier's own dominant call wins over a recomputed maximum.
        event.label = self.dominant_emotion;
        event.confidence = confidence;
        Ok(event)
    }
}
