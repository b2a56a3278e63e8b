//! End-to-end pipeline tests up to, but not including, FFmpeg encoding.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use emoline_media::{
    EmotionClassifier, FrameSampler, LiveAnalyzer, MediaResult, MemoryFrameSource, OverlayRenderer,
    SegmentPipeline, TimelineChartExporter,
};
use emoline_models::{Classification, FaceRegion, OverlayAnchor, RasterFrame};

/// Finds a face on exactly one call out of every ten.
struct OneInTen {
    calls: AtomicUsize,
}

#[async_trait]
impl EmotionClassifier for OneInTen {
    async fn classify(&self, _frame: &RasterFrame) -> MediaResult<Option<Classification>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call % 10 != 3 {
            return Ok(None);
        }
        Ok(Some(Classification {
            scores: BTreeMap::from([
                ("happy".to_string(), 71.0),
                ("surprise".to_string(), 29.0),
            ]),
            dominant_emotion: "happy".to_string(),
            region: FaceRegion { x: 100, y: 80, w: 64, h: 64 },
        }))
    }

    fn name(&self) -> &'static str {
        "one-in-ten"
    }
}

#[tokio::test]
async fn live_run_with_sparse_detections() {
    let classifier = Arc::new(OneInTen { calls: AtomicUsize::new(0) });
    let analyzer = LiveAnalyzer::new(classifier.clone(), FrameSampler::new(5, 25.0).unwrap(), 0.2);
    let mut source = MemoryFrameSource::blank(50, 4, 4);

    let outcome = analyzer.run(&mut source).await.unwrap();

    assert_eq!(classifier.calls.load(Ordering::SeqCst), 10);
    assert_eq!(outcome.stats.frames_sampled, 10);
    assert_eq!(outcome.stats.empty_detections, 9);
    assert_eq!(outcome.timeline.len(), 1);

    // Fourth sampled frame is index 15
    let event = &outcome.timeline.events()[0];
    assert!((event.start() - 0.6).abs() < 1e-9);

    let series = outcome.timeline.to_time_series();
    assert_eq!(series.len(), 1);
    assert_eq!(series.labels, vec!["happy".to_string(), "surprise".to_string()]);

    let overlays = outcome.timeline.to_overlay_intervals(0.2);
    assert_eq!(overlays.len(), 1);
    assert_eq!(overlays[0].text, "happy: 71.0%");

    let dir = TempDir::new().unwrap();
    let chart = dir.path().join("emotion_graph.png");
    TimelineChartExporter::default().export(&series, &chart).await.unwrap();
    assert!(chart.exists());
}

#[tokio::test]
async fn segment_run_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("insights.json");
    std::fs::write(
        &path,
        r#"{
            "videos": [{
                "insights": {
                    "emotions": [{"type": "happy", "instances": [
                        {"adjustedStart": "0:00:10.0", "adjustedEnd": "0:00:12.0", "confidence": 0.8}
                    ]}],
                    "sentiments": [{"sentimentType": "positive", "instances": [
                        {"adjustedStart": "0:00:05.0", "adjustedEnd": "0:00:20.0"}
                    ]}]
                }
            }]
        }"#,
    )
    .unwrap();

    let analysis = SegmentPipeline::load_analysis(&path).await.unwrap();
    let plan = SegmentPipeline::default().plan(&analysis);

    assert_eq!(plan.associations, 1);
    assert_eq!(plan.overlays.len(), 2);
    assert_eq!(plan.overlays[0].anchor, OverlayAnchor::BottomCenter);
    assert_eq!(plan.overlays[1].anchor, OverlayAnchor::TopCenter);
    assert_ne!(plan.overlays[0].vertical_offset, plan.overlays[1].vertical_offset);
    assert_eq!(plan.overlays[0].start_seconds, plan.overlays[1].start_seconds);
}

#[tokio::test]
async fn failed_render_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("broken.mp4");
    std::fs::write(&input, b"this is not a video container").unwrap();
    let output = dir.path().join("out").join("broken_with_emotions.mp4");

    // Fails at decode when FFmpeg is installed, or earlier when it is not.
    let result = OverlayRenderer::default().render(&input, &output, &[], &[]).await;

    assert!(result.is_err());
    assert!(!output.exists());
    let leftovers = std::fs::read_dir(dir.path().join("out")).unwrap().count();
    assert_eq!(leftovers, 0);
}
