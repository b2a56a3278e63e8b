//! Segment-analysis documents.
//!
//! The document is produced by an external video indexer. Only the first
//! video's emotion and sentiment insights are read:
//!
//! ```json
//! {
//!   "videos": [{
//!     "insights": {
//!       "emotions": [
//!         { "type": "Joy", "instances": [
//!           { "adjustedStart": "0:00:10.0", "adjustedEnd": "0:00:12.0", "confidence": 0.8 }
//!         ]}
//!       ],
//!       "sentiments": [
//!         { "sentimentType": "Positive", "instances": [
//!           { "adjustedStart": "0:00:05.0", "adjustedEnd": "0:00:20.0" }
//!         ]}
//!       ]
//!     }
//!   }]
//! }
//! ```

use serde::Deserialize;
use tracing::{debug, warn};

use crate::detection::{normalize_confidence, DetectionEvent, TimeInterval, DEFAULT_POINT_WIDTH_SECS};
use crate::error::{ModelError, ModelResult};
use crate::timestamp::parse_timestamp;

#[derive(Debug, Deserialize)]
struct AnalysisDocument {
    videos: Option<Vec<VideoEntry>>,
}

#[derive(Debug, Deserialize)]
struct VideoEntry {
    insights: Option<Insights>,
}

#[derive(Debug, Deserialize)]
struct Insights {
    emotions: Option<Vec<EmotionGroup>>,
    sentiments: Option<Vec<SentimentGroup>>,
}

#[derive(Debug, Deserialize)]
struct EmotionGroup {
    #[serde(rename = "type")]
    emotion_type: Option<String>,
    instances: Option<Vec<Instance>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentimentGroup {
    sentiment_type: Option<String>,
    instances: Option<Vec<Instance>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Instance {
    adjusted_start: Option<String>,
    adjusted_end: Option<String>,
    confidence: Option<f64>,
}

/// Emotion and sentiment streams read from one analysis document.
///
/// Both streams are sorted by start time; ties keep document order.
#[derive(Debug, Clone, Default)]
pub struct SegmentAnalysis {
    pub emotions: Vec<DetectionEvent>,
    pub sentiments: Vec<DetectionEvent>,
}

impl SegmentAnalysis {
    /// Parse a document from a JSON string.
    pub fn from_json_str(json: &str) -> ModelResult<Self> {
        let document: AnalysisDocument = serde_json::from_str(json)
            .map_err(|e| ModelError::malformed_input("$", e.to_string()))?;
        Self::from_document(document)
    }

    /// Parse a document from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> ModelResult<Self> {
        let document: AnalysisDocument = serde_json::from_slice(bytes)
            .map_err(|e| ModelError::malformed_input("$", e.to_string()))?;
        Self::from_document(document)
    }

    fn from_document(document: AnalysisDocument) -> ModelResult<Self> {
        let video = document
            .videos
            .ok_or_else(|| ModelError::malformed_input("videos", "missing field"))?
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::malformed_input("videos[0]", "no videos in document"))?;
        let insights = video
            .insights
            .ok_or_else(|| ModelError::malformed_input("videos[0].insights", "missing field"))?;
        let emotion_groups = insights.emotions.ok_or_else(|| {
            ModelError::malformed_input("videos[0].insights.emotions", "missing field")
        })?;

        let mut emotions = Vec::new();
        for (g, group) in emotion_groups.into_iter().enumerate() {
            let base = format!("videos[0].insights.emotions[{}]", g);
            let label = group
                .emotion_type
                .ok_or_else(|| ModelError::malformed_input(format!("{}.type", base), "missing field"))?;
            let instances = group
                .instances
                .ok_or_else(|| ModelError::malformed_input(format!("{}.instances", base), "missing field"))?;

            for (i, instance) in instances.iter().enumerate() {
                let path = format!("{}.instances[{}]", base, i);
                let interval = instance_interval(instance, &path)?;
                let raw = instance
                    .confidence
                    .ok_or_else(|| ModelError::malformed_input(format!("{}.confidence", path), "missing field"))?;
                let confidence = normalize_confidence(raw)
                    .map_err(|e| ModelError::malformed_input(format!("{}.confidence", path), e.to_string()))?;
                emotions.push(DetectionEvent::emotion(label.clone(), confidence, interval)?);
            }
        }

        let sentiment_groups = match insights.sentiments {
            Some(groups) => groups,
            None => {
                warn!("Analysis document has no sentiments; continuing without sentiment overlays");
                Vec::new()
            }
        };

        let mut sentiments = Vec::new();
        for (g, group) in sentiment_groups.into_iter().enumerate() {
            let base = format!("videos[0].insights.sentiments[{}]", g);
            let label = group.sentiment_type.ok_or_else(|| {
                ModelError::malformed_input(format!("{}.sentimentType", base), "missing field")
            })?;
            let instances = group
                .instances
                .ok_or_else(|| ModelError::malformed_input(format!("{}.instances", base), "missing field"))?;

            for (i, instance) in instances.iter().enumerate() {
                let path = format!("{}.instances[{}]", base, i);
                let interval = instance_interval(instance, &path)?;
                let confidence = instance
                    .confidence
                    .map(normalize_confidence)
                    .transpose()
                    .map_err(|e| ModelError::malformed_input(format!("{}.confidence", path), e.to_string()))?;
                sentiments.push(DetectionEvent::sentiment(label.clone(), confidence, interval)?);
            }
        }

        emotions.sort_by(|a, b| a.start().total_cmp(&b.start()));
        sentiments.sort_by(|a, b| a.start().total_cmp(&b.start()));

        debug!(
            emotions = emotions.len(),
            sentiments = sentiments.len(),
            "Parsed segment analysis"
        );

        Ok(Self {
            emotions,
            sentiments,
        })
    }
}

fn instance_interval(instance: &Instance, path: &str) -> ModelResult<TimeInterval> {
    let start = timestamp_field(instance.adjusted_start.as_deref(), &format!("{}.adjustedStart", path))?;
    let end = timestamp_field(instance.adjusted_end.as_deref(), &format!("{}.adjustedEnd", path))?;
    // Sub-tenth instances collapse to a point after truncation.
    if end == start {
        debug!(path, start, "Widening zero-length instance");
        return TimeInterval::point(start, DEFAULT_POINT_WIDTH_SECS)
            .map_err(|e| ModelError::malformed_input(path, e.to_string()));
    }
    TimeInterval::new(start, end).map_err(|e| ModelError::malformed_input(path, e.to_string()))
}

fn timestamp_field(value: Option<&str>, path: &str) -> ModelResult<f64> {
    let value = value.ok_or_else(|| ModelError::malformed_input(path, "missing field"))?;
    parse_timestamp(value).map_err(|e| ModelError::malformed_input(path, e.to_string()))
}
