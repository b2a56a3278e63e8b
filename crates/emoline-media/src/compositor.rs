//! Projection of detection events into overlay directives.
//!
//! Emotion labels sit at the bottom centre. Sentiment labels stack down
//! from the top centre in input order, so simultaneous overlays never share
//! a line.

use emoline_models::{BoxDirective, DetectionEvent, EventKind, OverlayAnchor, OverlayDirective};

use crate::merge::MergedSegment;

/// Gap kept between a face box and a label placed above it.
const FACE_LABEL_GAP: i32 = 10;

/// Pixel layout for stacked overlays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    /// Offset of emotion labels from the bottom edge
    pub emotion_offset: u32,
    /// Offset of the first sentiment label from the top edge
    pub sentiment_offset: u32,
    /// Distance between consecutive stacked labels
    pub line_spacing: u32,
    /// Place live labels just above the detected face instead of bottom centre
    pub follow_faces: bool,
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            emotion_offset: 0,
            sentiment_offset: 50,
            line_spacing: 40,
            follow_faces: false,
        }
    }
}

/// Builds overlay directives from events or merged segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayCompositor {
    layout: OverlayLayout,
}

impl OverlayCompositor {
    pub fn new(layout: OverlayLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &OverlayLayout {
        &self.layout
    }

    /// Directive for a single event of either kind.
    pub fn compose_event(&self, event: &DetectionEvent, min_duration: f64) -> OverlayDirective {
        match event.kind {
            EventKind::Emotion => self.compose_emotion(event, min_duration),
            EventKind::Sentiment => self.sentiment_directive(event, 0, event, min_duration),
        }
    }

    /// `"{label}: {pct}%"` for the event's dominant label.
    pub fn compose_emotion(&self, event: &DetectionEvent, min_duration: f64) -> OverlayDirective {
        let anchor = match (self.layout.follow_faces, event.region) {
            (true, Some(region)) => OverlayAnchor::Pixel {
                x: region.x,
                y: region.y - FACE_LABEL_GAP,
            },
            _ => OverlayAnchor::BottomCenter,
        };

        OverlayDirective {
            text: emotion_text(&event.label, event.confidence),
            anchor,
            vertical_offset: self.layout.emotion_offset,
            start_seconds: event.start(),
            duration_seconds: width(event, min_duration),
        }
    }

    /// Emotion directive first, then one directive per associated sentiment,
    /// all sharing the emotion's time window.
    pub fn compose_merged(&self, merged: &MergedSegment<'_>, min_duration: f64) -> Vec<OverlayDirective> {
        let mut directives = Vec::with_capacity(1 + merged.sentiments.len());
        directives.push(self.compose_emotion(merged.emotion, min_duration));
        for (idx, sentiment) in merged.sentiments.iter().enumerate() {
            directives.push(self.sentiment_directive(sentiment, idx, merged.emotion, min_duration));
        }
        directives
    }

    /// Directives for every merged segment, in segment order.
    pub fn compose_all(&self, merged: &[MergedSegment<'_>], min_duration: f64) -> Vec<OverlayDirective> {
        merged
            .iter()
            .flat_map(|segment| self.compose_merged(segment, min_duration))
            .collect()
    }

    /// Face rectangle for events that carry a region.
    pub fn compose_box(event: &DetectionEvent, min_duration: f64) -> Option<BoxDirective> {
        event.region.map(|region| BoxDirective {
            region,
            start_seconds: event.start(),
            duration_seconds: width(event, min_duration),
        })
    }

    fn sentiment_directive(
        &self,
        sentiment: &DetectionEvent,
        stack_index: usize,
        window: &DetectionEvent,
        min_duration: f64,
    ) -> OverlayDirective {
        OverlayDirective {
            text: format!("Sentiment: {}", sentiment.label),
            anchor: OverlayAnchor::TopCenter,
            vertical_offset: self.layout.sentiment_offset + stack_index as u32 * self.layout.line_spacing,
            start_seconds: window.start(),
            duration_seconds: width(window, min_duration),
        }
    }
}

fn emotion_text(label: &str, confidence: f64) -> String {
    format!("{}: {:.1}%", label, confidence * 100.0)
}

fn width(event: &DetectionEvent, min_duration: f64) -> f64 {
    event.interval.duration().max(min_duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emoline_models::{Classification, FaceRegion, TimeInterval};
    use std::collections::BTreeMap;

    fn emotion(label: &str, confidence: f64, start: f64, end: f64) -> DetectionEvent {
        DetectionEvent::emotion(label, confidence, TimeInterval::new(start, end).unwrap()).unwrap()
    }

    fn sentiment(label: &str, start: f64, end: f64) -> DetectionEvent {
        DetectionEvent::sentiment(label, None, TimeInterval::new(start, end).unwrap()).unwrap()
    }

    #[test]
    fn test_solo_emotion_bottom_center() {
        let compositor = OverlayCompositor::default();
        let directive = compositor.compose_emotion(&emotion("happy", 0.8, 10.0, 12.0), 0.2);
        assert_eq!(directive.text, "happy: 80.0%");
        assert_eq!(directive.anchor, OverlayAnchor::BottomCenter);
        assert_eq!(directive.start_seconds, 10.0);
        assert!((directive.duration_seconds - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_tied_scores_show_classifier_dominant_call() {
        let classification = Classification {
            scores: BTreeMap::from([("happy".to_string(), 40.0), ("sad".to_string(), 40.0)]),
            dominant_emotion: "sad".to_string(),
            region: FaceRegion { x: 0, y: 0, w: 10, h: 10 },
        };
        let event = classification.into_event(1.0, 0.2).unwrap();
        let directive = OverlayCompositor::default().compose_emotion(&event, 0.2);
        assert_eq!(event.label, "sad");
        assert_eq!(directive.text, "sad: 40.0%");
    }

    #[test]
    fn test_merged_pair_emits_non_colliding_directives() {
        let compositor = OverlayCompositor::default();
        let happy = emotion("happy", 0.8, 10.0, 12.0);
        let positive = sentiment("positive", 5.0, 20.0);
        let merged = MergedSegment {
            emotion: &happy,
            sentiments: vec![&positive],
        };

        let directives = compositor.compose_merged(&merged, 0.2);
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].text, "happy: 80.0%");
        assert_eq!(directives[1].text, "Sentiment: positive");
        assert_eq!(directives[1].start_seconds, 10.0);
        assert!((directives[1].duration_seconds - 2.0).abs() < 1e-9);
        assert_ne!(
            (directives[0].anchor, directives[0].vertical_offset),
            (directives[1].anchor, directives[1].vertical_offset)
        );
    }

    #[test]
    fn test_sentiments_stack_in_input_order() {
        let compositor = OverlayCompositor::default();
        let happy = emotion("happy", 0.8, 10.0, 12.0);
        let a = sentiment("positive", 5.0, 20.0);
        let b = sentiment("neutral", 0.0, 30.0);
        let merged = MergedSegment {
            emotion: &happy,
            sentiments: vec![&a, &b],
        };

        let directives = compositor.compose_merged(&merged, 0.2);
        assert_eq!(directives.len(), 3);
        assert_eq!(directives[1].vertical_offset, 50);
        assert_eq!(directives[2].vertical_offset, 90);
        assert_eq!(directives[2].text, "Sentiment: neutral");
    }

    #[test]
    fn test_follow_faces_anchors_above_region() {
        let compositor = OverlayCompositor::new(OverlayLayout {
            follow_faces: true,
            ..Default::default()
        });
        let mut event = emotion("sad", 0.5, 1.0, 1.2);
        event.region = Some(FaceRegion { x: 100, y: 80, w: 50, h: 50 });

        let directive = compositor.compose_emotion(&event, 0.2);
        assert_eq!(directive.anchor, OverlayAnchor::Pixel { x: 100, y: 70 });
        assert!(OverlayCompositor::compose_box(&event, 0.2).is_some());
        assert!(OverlayCompositor::compose_box(&emotion("sad", 0.5, 1.0, 1.2), 0.2).is_none());
    }

    #[test]
    fn test_compose_all_flattens_in_order() {
        let compositor = OverlayCompositor::default();
        let first = emotion("happy", 0.8, 1.0, 2.0);
        let second = emotion("sad", 0.3, 3.0, 4.0);
        let merged = vec![
            MergedSegment {
                emotion: &first,
                sentiments: vec![],
            },
            MergedSegment {
                emotion: &second,
                sentiments: vec![],
            },
        ];
        let texts: Vec<String> = compositor
            .compose_all(&merged, 0.2)
            .into_iter()
            .map(|d| d.text)
            .collect();
        assert_eq!(texts, vec!["happy: 80.0%", "sad: 30.0%"]);
    }
}
