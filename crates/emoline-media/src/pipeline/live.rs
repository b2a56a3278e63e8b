//! Per-frame live analysis.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use emoline_models::{DetectionEvent, RasterFrame};

use crate::classifier::EmotionClassifier;
use crate::error::MediaResult;
use crate::frames::FrameSource;
use crate::metrics;
use crate::sampler::FrameSampler;
use crate::timeline::{Timeline, TimelineBuilder};

/// Counts collected during one live run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LiveStats {
    pub frames_decoded: u64,
    pub frames_sampled: u64,
    pub detections: u64,
    pub empty_detections: u64,
    pub classifier_failures: u64,
    /// Detections that replaced an earlier one at the same timestamp
    pub replaced: u64,
}

/// Result of a live run.
#[derive(Debug, Clone)]
pub struct LiveOutcome {
    pub timeline: Timeline,
    pub stats: LiveStats,
}

/// Samples frames, classifies them and accumulates a timeline.
///
/// Frames are processed strictly in decode order: each classifier call
/// completes before the next frame is read.
pub struct LiveAnalyzer {
    classifier: Arc<dyn EmotionClassifier>,
    sampler: FrameSampler,
    point_width: f64,
}

impl LiveAnalyzer {
    pub fn new(classifier: Arc<dyn EmotionClassifier>, sampler: FrameSampler, point_width: f64) -> Self {
        Self {
            classifier,
            sampler,
            point_width,
        }
    }

    pub fn sampler(&self) -> &FrameSampler {
        &self.sampler
    }

    /// Drain `source` and return the finished timeline.
    ///
    /// Frames where the classifier is unavailable or returns an invalid
    /// result are logged and skipped. Decode errors end the run.
    pub async fn run<S: FrameSource + ?Sized>(&self, source: &mut S) -> MediaResult<LiveOutcome> {
        let mut builder = TimelineBuilder::new();
        let mut stats = LiveStats::default();

        while let Some(frame) = source.next_frame().await? {
            stats.frames_decoded += 1;
            metrics::record_frame_decoded();

            if !self.sampler.should_sample(frame.index) {
                continue;
            }
            stats.frames_sampled += 1;
            metrics::record_frame_sampled();

            match self.classify_frame(&frame).await {
                Ok(Some(event)) => {
                    stats.detections += 1;
                    metrics::record_detection(true);
                    debug!(
                        frame_idx = frame.index,
                        label = %event.label,
                        confidence = event.confidence,
                        "Detection"
                    );
                    if builder.add_detection(event) {
                        stats.replaced += 1;
                    }
                }
                Ok(None) => {
                    stats.empty_detections += 1;
                    metrics::record_detection(false);
                }
                Err(e) if e.is_frame_recoverable() => {
                    stats.classifier_failures += 1;
                    metrics::record_classifier_failure(self.classifier.name());
                    warn!(
                        frame_idx = frame.index,
                        classifier = self.classifier.name(),
                        error = %e,
                        "Classification failed, skipping frame"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        let timeline = builder.finish();
        if timeline.is_empty() {
            info!(frames = stats.frames_decoded, "No detections; timeline is empty");
        } else {
            info!(
                frames = stats.frames_decoded,
                sampled = stats.frames_sampled,
                events = timeline.len(),
                failures = stats.classifier_failures,
                "Live analysis complete"
            );
        }

        Ok(LiveOutcome { timeline, stats })
    }

    async fn classify_frame(&self, frame: &RasterFrame) -> MediaResult<Option<DetectionEvent>> {
        let Some(classification) = self.classifier.classify(frame).await? else {
            return Ok(None);
        };
        let at = self.sampler.seconds_at(frame.index);
        Ok(Some(classification.into_event(at, self.point_width)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use crate::frames::MemoryFrameSource;
    use async_trait::async_trait;
    use emoline_models::{Classification, FaceRegion};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Answers per frame index; unlisted frames find no face.
    struct Scripted {
        answers: BTreeMap<u64, Result<&'static str, &'static str>>,
        seen: Mutex<Vec<u64>>,
    }

    impl Scripted {
        fn new(answers: impl IntoIterator<Item = (u64, Result<&'static str, &'static str>)>) -> Self {
            Self {
                answers: answers.into_iter().collect(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EmotionClassifier for Scripted {
        async fn classify(&self, frame: &RasterFrame) -> MediaResult<Option<Classification>> {
            self.seen.lock().unwrap().push(frame.index);
            match self.answers.get(&frame.index) {
                Some(Ok(label)) => Ok(Some(Classification {
                    scores: BTreeMap::from([(label.to_string(), 90.0), ("neutral".to_string(), 10.0)]),
                    dominant_emotion: label.to_string(),
                    region: FaceRegion { x: 1, y: 2, w: 3, h: 4 },
                })),
                Some(Err(msg)) => Err(MediaError::classifier_unavailable(*msg)),
                None => Ok(None),
            }
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn analyzer(classifier: Arc<Scripted>, stride: u64) -> LiveAnalyzer {
        LiveAnalyzer::new(classifier, FrameSampler::new(stride, 25.0).unwrap(), 0.2)
    }

    #[tokio::test]
    async fn test_only_sampled_frames_are_classified() {
        let classifier = Arc::new(Scripted::new([]));
        let mut source = MemoryFrameSource::blank(12, 2, 2);

        let outcome = analyzer(classifier.clone(), 5).run(&mut source).await.unwrap();

        assert_eq!(*classifier.seen.lock().unwrap(), vec![0, 5, 10]);
        assert_eq!(outcome.stats.frames_decoded, 12);
        assert_eq!(outcome.stats.frames_sampled, 3);
        assert_eq!(outcome.stats.empty_detections, 3);
        assert!(outcome.timeline.is_empty());
    }

    #[tokio::test]
    async fn test_detection_timestamp() {
        let classifier = Arc::new(Scripted::new([(20, Ok("happy"))]));
        let mut source = MemoryFrameSource::blank(25, 2, 2);

        let outcome = analyzer(classifier, 5).run(&mut source).await.unwrap();

        let events = outcome.timeline.events();
        assert_eq!(events.len(), 1);
        assert!((events[0].start() - 0.8).abs() < 1e-9);
        assert_eq!(events[0].label, "happy");
    }

    #[tokio::test]
    async fn test_classifier_failure_skips_frame() {
        let classifier = Arc::new(Scripted::new([(0, Err("connection refused")), (5, Ok("sad"))]));
        let mut source = MemoryFrameSource::blank(10, 2, 2);

        let outcome = analyzer(classifier, 5).run(&mut source).await.unwrap();

        assert_eq!(outcome.stats.classifier_failures, 1);
        assert_eq!(outcome.stats.detections, 1);
        assert_eq!(outcome.timeline.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_classification_is_skipped() {
        struct Broken;

        #[async_trait]
        impl EmotionClassifier for Broken {
            async fn classify(&self, _frame: &RasterFrame) -> MediaResult<Option<Classification>> {
                Ok(Some(Classification {
                    scores: BTreeMap::from([("happy".to_string(), 50.0)]),
                    dominant_emotion: "angry".to_string(),
                    region: FaceRegion { x: 0, y: 0, w: 1, h: 1 },
                }))
            }

            fn name(&self) -> &'static str {
                "broken"
            }
        }

        let analyzer = LiveAnalyzer::new(Arc::new(Broken), FrameSampler::new(1, 10.0).unwrap(), 0.2);
        let mut source = MemoryFrameSource::blank(3, 1, 1);
        let outcome = analyzer.run(&mut source).await.unwrap();

        assert_eq!(outcome.stats.classifier_failures, 3);
        assert!(outcome.timeline.is_empty());
    }
}
