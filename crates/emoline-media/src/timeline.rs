//! Emotion timeline accumulation and export.
//!
//! Events from either pipeline are collected into a [`TimelineBuilder`],
//! keyed by `(kind, start)`. A later event at the same key replaces the
//! earlier one in place (last write wins), keeping its insertion slot so
//! start-time ties still resolve by first arrival.
//!
//! # Time series schema
//! ```json
//! {
//!   "labels": ["angry", "happy", "sad"],
//!   "rows": [
//!     { "timestamp": 0.0, "values": { "happy": 0.82, "sad": 0.11 } },
//!     { "timestamp": 0.2, "values": { "angry": 0.4, "happy": 0.35 } }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info};

use emoline_models::{BoxDirective, DetectionEvent, EventKind, OverlayDirective};

use crate::compositor::OverlayCompositor;
use crate::error::MediaResult;

/// Start times closer than one microsecond share a key.
fn start_key(start: f64) -> i64 {
    (start * 1_000_000.0).round() as i64
}

/// One row of the time series: every label scored at a timestamp.
///
/// Labels absent at this timestamp are absent from `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRow {
    pub timestamp: f64,
    pub values: BTreeMap<String, f64>,
}

/// Emotion confidences over time, normalized to [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Every label seen across all rows, sorted
    pub labels: Vec<String>,
    pub rows: Vec<TimeSeriesRow>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one label in row order; `None` where the label is missing.
    pub fn column(&self, label: &str) -> Vec<Option<f64>> {
        self.rows
            .iter()
            .map(|row| row.values.get(label).copied())
            .collect()
    }

    /// Export to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the table to `path` atomically.
    pub async fn write_to_file(&self, path: impl AsRef<Path>) -> MediaResult<()> {
        let json = self.to_json()?;
        crate::fs_utils::write_atomic(path.as_ref(), json.as_bytes()).await?;
        info!(path = %path.as_ref().display(), rows = self.rows.len(), "Wrote time series");
        Ok(())
    }
}

/// Incrementally accumulates detection events for one video.
#[derive(Debug, Default)]
pub struct TimelineBuilder {
    events: Vec<DetectionEvent>,
    slots: HashMap<(EventKind, i64), usize>,
}

impl TimelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event. Returns `true` if it replaced an event of the same kind
    /// at the same start time.
    pub fn add_detection(&mut self, event: DetectionEvent) -> bool {
        let key = (event.kind, start_key(event.start()));
        match self.slots.get(&key) {
            Some(&slot) => {
                debug!(
                    kind = %event.kind,
                    start = event.start(),
                    previous = %self.events[slot].label,
                    label = %event.label,
                    "Replacing detection at identical timestamp"
                );
                self.events[slot] = event;
                true
            }
            None => {
                self.slots.insert(key, self.events.len());
                self.events.push(event);
                false
            }
        }
    }

    /// Add every event from an iterator, in order.
    pub fn extend<I: IntoIterator<Item = DetectionEvent>>(&mut self, events: I) {
        for event in events {
            self.add_detection(event);
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Emotion rows in ascending start time.
    pub fn to_time_series(&self) -> TimeSeries {
        build_time_series(self.ordered())
    }

    /// One overlay per event, at least `min_duration` seconds wide.
    pub fn to_overlay_intervals(&self, min_duration: f64) -> Vec<OverlayDirective> {
        self.to_overlay_intervals_with(&OverlayCompositor::default(), min_duration)
    }

    /// Like [`Self::to_overlay_intervals`] with a custom compositor.
    pub fn to_overlay_intervals_with(
        &self,
        compositor: &OverlayCompositor,
        min_duration: f64,
    ) -> Vec<OverlayDirective> {
        build_overlays(self.ordered(), compositor, min_duration)
    }

    /// Freeze the builder into an ordered, read-only timeline.
    pub fn finish(self) -> Timeline {
        let order = self.order();
        let mut slots: Vec<Option<DetectionEvent>> = self.events.into_iter().map(Some).collect();
        let events = order
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect();
        Timeline { events }
    }

    /// Insertion indices stably sorted by start time.
    fn order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.events.len()).collect();
        order.sort_by(|&a, &b| self.events[a].start().total_cmp(&self.events[b].start()));
        order
    }

    fn ordered(&self) -> impl Iterator<Item = &DetectionEvent> + '_ {
        self.order().into_iter().map(move |idx| &self.events[idx])
    }
}

/// A finished timeline, ordered by start time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    events: Vec<DetectionEvent>,
}

impl Timeline {
    pub fn events(&self) -> &[DetectionEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn emotions(&self) -> impl Iterator<Item = &DetectionEvent> {
        self.events.iter().filter(|e| e.kind == EventKind::Emotion)
    }

    pub fn sentiments(&self) -> impl Iterator<Item = &DetectionEvent> {
        self.events.iter().filter(|e| e.kind == EventKind::Sentiment)
    }

    /// Distinct labels across all events, sorted.
    pub fn labels(&self) -> Vec<String> {
        self.events
            .iter()
            .map(|e| e.label.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn to_time_series(&self) -> TimeSeries {
        build_time_series(self.events.iter())
    }

    pub fn to_overlay_intervals(&self, min_duration: f64) -> Vec<OverlayDirective> {
        self.to_overlay_intervals_with(&OverlayCompositor::default(), min_duration)
    }

    pub fn to_overlay_intervals_with(
        &self,
        compositor: &OverlayCompositor,
        min_duration: f64,
    ) -> Vec<OverlayDirective> {
        build_overlays(self.events.iter(), compositor, min_duration)
    }

    /// Face rectangles for events that carry a region.
    pub fn to_box_directives(&self, min_duration: f64) -> Vec<BoxDirective> {
        self.events
            .iter()
            .filter_map(|e| OverlayCompositor::compose_box(e, min_duration))
            .collect()
    }
}

fn build_time_series<'a>(events: impl Iterator<Item = &'a DetectionEvent>) -> TimeSeries {
    let mut labels = BTreeSet::new();
    let rows: Vec<TimeSeriesRow> = events
        .filter(|e| e.kind == EventKind::Emotion)
        .map(|e| {
            let values = if e.scores.is_empty() {
                BTreeMap::from([(e.label.clone(), e.confidence)])
            } else {
                e.scores.clone()
            };
            labels.extend(values.keys().cloned());
            TimeSeriesRow {
                timestamp: e.start(),
                values,
            }
        })
        .collect();

    TimeSeries {
        labels: labels.into_iter().collect(),
        rows,
    }
}

fn build_overlays<'a>(
    events: impl Iterator<Item = &'a DetectionEvent>,
    compositor: &OverlayCompositor,
    min_duration: f64,
) -> Vec<OverlayDirective> {
    events
        .map(|e| compositor.compose_event(e, min_duration))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use emoline_models::{FaceRegion, TimeInterval};

    fn point(label: &str, confidence: f64, at: f64) -> DetectionEvent {
        DetectionEvent::emotion(label, confidence, TimeInterval::point(at, 0.2).unwrap()).unwrap()
    }

    fn live(at: f64, scores: &[(&str, f64)]) -> DetectionEvent {
        let scores = scores.iter().map(|(l, v)| (l.to_string(), *v)).collect();
        DetectionEvent::from_scores(
            scores,
            TimeInterval::point(at, 0.2).unwrap(),
            Some(FaceRegion { x: 10, y: 20, w: 30, h: 40 }),
        )
        .unwrap()
    }

    #[test]
    fn test_time_series_sorted_regardless_of_insertion() {
        let mut builder = TimelineBuilder::new();
        for at in [3.0, 0.4, 2.2, 0.0, 1.6] {
            builder.add_detection(point("happy", 0.5, at));
        }
        let series = builder.to_time_series();
        let stamps: Vec<f64> = series.rows.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![0.0, 0.4, 1.6, 2.2, 3.0]);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_last_write_wins_at_same_timestamp() {
        let mut builder = TimelineBuilder::new();
        assert!(!builder.add_detection(point("happy", 0.5, 1.0)));
        assert!(builder.add_detection(point("sad", 0.9, 1.0)));
        assert_eq!(builder.len(), 1);

        let series = builder.to_time_series();
        assert_eq!(series.len(), 1);
        assert_eq!(series.rows[0].values.get("sad"), Some(&0.9));
        assert!(series.rows[0].values.get("happy").is_none());
    }

    #[test]
    fn test_identical_event_is_idempotent() {
        let mut builder = TimelineBuilder::new();
        builder.add_detection(point("happy", 0.5, 1.0));
        builder.add_detection(point("sad", 0.4, 2.0));
        let before = builder.to_time_series().len();
        builder.add_detection(point("happy", 0.5, 1.0));
        assert_eq!(builder.to_time_series().len(), before);
    }

    #[test]
    fn test_same_start_different_kind_kept() {
        let mut builder = TimelineBuilder::new();
        builder.add_detection(point("happy", 0.5, 1.0));
        builder.add_detection(
            DetectionEvent::sentiment("positive", None, TimeInterval::new(1.0, 4.0).unwrap()).unwrap(),
        );
        assert_eq!(builder.len(), 2);
        // Sentiments never become time series rows.
        assert_eq!(builder.to_time_series().len(), 1);
    }

    #[test]
    fn test_missing_labels_are_absent() {
        let mut builder = TimelineBuilder::new();
        builder.add_detection(live(0.0, &[("happy", 0.8), ("sad", 0.2)]));
        builder.add_detection(live(0.2, &[("angry", 0.6)]));

        let series = builder.to_time_series();
        assert_eq!(series.labels, vec!["angry", "happy", "sad"]);
        assert_eq!(series.column("angry"), vec![None, Some(0.6)]);
        assert_eq!(series.column("happy"), vec![Some(0.8), None]);
    }

    #[test]
    fn test_overlay_intervals_use_dominant_and_min_width() {
        let mut builder = TimelineBuilder::new();
        builder.add_detection(live(0.4, &[("happy", 0.3), ("surprise", 0.65)]));
        builder.add_detection(
            DetectionEvent::emotion("sad", 0.5, TimeInterval::new(1.0, 3.0).unwrap()).unwrap(),
        );

        let overlays = builder.to_overlay_intervals(0.5);
        assert_eq!(overlays.len(), 2);
        assert_eq!(overlays[0].text, "surprise: 65.0%");
        assert!((overlays[0].duration_seconds - 0.5).abs() < 1e-9);
        assert!((overlays[1].duration_seconds - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_overlay_ties_keep_insertion_order() {
        let mut builder = TimelineBuilder::new();
        builder.add_detection(
            DetectionEvent::sentiment("negative", None, TimeInterval::new(2.0, 5.0).unwrap()).unwrap(),
        );
        builder.add_detection(point("fear", 0.7, 2.0));
        builder.add_detection(point("happy", 0.7, 1.0));

        let texts: Vec<String> = builder
            .to_overlay_intervals(0.2)
            .into_iter()
            .map(|o| o.text)
            .collect();
        assert_eq!(texts, vec!["happy: 70.0%", "Sentiment: negative", "fear: 70.0%"]);
    }

    #[test]
    fn test_overlapping_same_kind_pass_through() {
        let mut builder = TimelineBuilder::new();
        builder.add_detection(
            DetectionEvent::emotion("happy", 0.5, TimeInterval::new(0.0, 4.0).unwrap()).unwrap(),
        );
        builder.add_detection(
            DetectionEvent::emotion("sad", 0.5, TimeInterval::new(1.0, 2.0).unwrap()).unwrap(),
        );
        let overlays = builder.to_overlay_intervals(0.2);
        assert_eq!(overlays.len(), 2);
        assert!(overlays[0].end_seconds() > overlays[1].start_seconds);
    }

    #[test]
    fn test_finish_orders_events() {
        let mut builder = TimelineBuilder::new();
        builder.add_detection(live(1.0, &[("happy", 0.9)]));
        builder.add_detection(live(0.2, &[("sad", 0.6)]));
        let timeline = builder.finish();

        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.events()[0].label, "sad");
        assert_eq!(timeline.labels(), vec!["happy", "sad"]);
        assert_eq!(timeline.to_box_directives(0.2).len(), 2);
        assert_eq!(timeline.emotions().count(), 2);
        assert_eq!(timeline.sentiments().count(), 0);
    }

    #[test]
    fn test_time_series_json() {
        let mut builder = TimelineBuilder::new();
        builder.add_detection(point("happy", 0.5, 1.0));
        let json = builder.to_time_series().to_json().unwrap();
        let back: TimeSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(back.labels, vec!["happy"]);
        assert_eq!(back.rows[0].timestamp, 1.0);
    }

    #[tokio::test]
    async fn test_write_time_series() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("series.json");
        let mut builder = TimelineBuilder::new();
        builder.add_detection(point("happy", 0.5, 1.0));
        builder.to_time_series().write_to_file(&path).await.unwrap();
        assert!(path.exists());
    }
}
