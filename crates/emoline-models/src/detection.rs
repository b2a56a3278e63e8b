//! Detection events: a label with a confidence, active over an interval.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ModelError, ModelResult};

/// Default width given to point samples so they stay renderable.
pub const DEFAULT_POINT_WIDTH_SECS: f64 = 0.2;

/// Which stream an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Emotion,
    Sentiment,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Emotion => write!(f, "emotion"),
            Self::Sentiment => write!(f, "sentiment"),
        }
    }
}

/// Half-open time interval `[start, end)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: f64,
    pub end: f64,
}

impl TimeInterval {
    /// Create an interval, rejecting negative starts and empty or inverted spans.
    pub fn new(start: f64, end: f64) -> ModelResult<Self> {
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end <= start {
            return Err(ModelError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Interval for a point sample at `at`, widened to `width` seconds.
    pub fn point(at: f64, width: f64) -> ModelResult<Self> {
        Self::new(at, at + width)
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether this interval fully encloses `other`.
    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && self.end >= other.end
    }
}

/// Face bounding box in source-frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

/// Normalize a confidence on a known 0..1 scale.
pub fn confidence_from_fraction(value: f64) -> ModelResult<f64> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ModelError::InvalidConfidence(value));
    }
    Ok(value)
}

/// Normalize a confidence on a known 0..100 scale.
pub fn confidence_from_percent(value: f64) -> ModelResult<f64> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ModelError::InvalidConfidence(value));
    }
    Ok(value / 100.0)
}

/// Normalize a confidence whose scale is not known up front.
///
/// Values up to 1.0 are taken as fractions, values in (1, 100] as percentages.
pub fn normalize_confidence(value: f64) -> ModelResult<f64> {
    if value > 1.0 {
        confidence_from_percent(value)
    } else {
        confidence_from_fraction(value)
    }
}

/// A single observation from either pipeline.
///
/// `confidence` is always normalized to [0, 1]. `scores` carries the full
/// label mapping for live detections; segment events hold at most one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub kind: EventKind,
    pub label: String,
    pub confidence: f64,
    pub interval: TimeInterval,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scores: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<FaceRegion>,
}

impl DetectionEvent {
    /// Emotion segment with a fractional confidence.
    pub fn emotion(label: impl Into<String>, confidence: f64, interval: TimeInterval) -> ModelResult<Self> {
        let label = label.into();
        let confidence = confidence_from_fraction(confidence)?;
        let scores = BTreeMap::from([(label.clone(), confidence)]);
        Ok(Self {
            kind: EventKind::Emotion,
            label,
            confidence,
            interval,
            scores,
            region: None,
        })
    }

    /// Sentiment segment. Sentiment instances rarely carry a score, in which
    /// case confidence is 1.0 and no score entry is recorded.
    pub fn sentiment(label: impl Into<String>, confidence: Option<f64>, interval: TimeInterval) -> ModelResult<Self> {
        let label = label.into();
        let (confidence, scores) = match confidence {
            Some(c) => {
                let c = confidence_from_fraction(c)?;
                (c, BTreeMap::from([(label.clone(), c)]))
            }
            None => (1.0, BTreeMap::new()),
        };
        Ok(Self {
            kind: EventKind::Sentiment,
            label,
            confidence,
            interval,
            scores,
            region: None,
        })
    }

    /// Live per-frame detection carrying a full normalized score mapping.
    ///
    /// The label is the dominant entry of `scores`.
    pub fn from_scores(
        scores: BTreeMap<String, f64>,
        interval: TimeInterval,
        region: Option<FaceRegion>,
    ) -> ModelResult<Self> {
        for value in scores.values() {
            confidence_from_fraction(*value)?;
        }
        let (label, confidence) = dominant(&scores)
            .map(|(l, c)| (l.to_string(), c))
            .ok_or_else(|| ModelError::InvalidClassification("empty score mapping".to_string()))?;
        Ok(Self {
            kind: EventKind::Emotion,
            label,
            confidence,
            interval,
            scores,
            region,
        })
    }

    pub fn start(&self) -> f64 {
        self.interval.start
    }

    pub fn end(&self) -> f64 {
        self.interval.end
    }
}

/// Highest-confidence entry. Ties keep the alphabetically first label.
fn dominant(scores: &BTreeMap<String, f64>) -> Option<(&str, f64)> {
    scores.iter().fold(None, |best, (label, &value)| match best {
        Some((_, best_value)) if best_value >= value => best,
        _ => Some((label.as_str(), value)),
    })
}
