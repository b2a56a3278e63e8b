//! `emoline live`: classify sampled frames and annotate the video.

use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use emoline_classifier::{ClassifierConfig, HttpEmotionClassifier};
use emoline_media::{
    probe_video, FrameReader, FrameSampler, LiveAnalyzer, LiveStats, OverlayCompositor, OverlayRenderer,
    TimelineChartExporter,
};

use crate::cli::LiveArgs;
use crate::config::PipelineConfig;

/// What a live run produced.
#[derive(Debug, Clone, Serialize)]
pub struct LiveSummary {
    pub stats: LiveStats,
    pub events: usize,
    pub video: Option<PathBuf>,
    pub chart: PathBuf,
    pub series: Option<PathBuf>,
}

pub async fn run_live(
    args: &LiveArgs,
    config: &PipelineConfig,
    mut classifier_config: ClassifierConfig,
) -> anyhow::Result<LiveSummary> {
    if let Some(url) = &args.classifier_url {
        classifier_config.base_url = url.clone();
    }

    let info = probe_video(&args.video)
        .await
        .with_context(|| format!("failed to probe {}", args.video.display()))?;
    let sampler = FrameSampler::new(config.sample_stride, info.fps).context("invalid sampling settings")?;

    let classifier = HttpEmotionClassifier::new(classifier_config).context("failed to build classifier client")?;
    if !classifier.health_check().await.unwrap_or(false) {
        warn!(
            url = %classifier.config().base_url,
            "Classifier health check failed; frames will be skipped until it responds"
        );
    }

    info!(
        video = %args.video.display(),
        fps = info.fps,
        stride = sampler.stride(),
        "Starting live analysis"
    );

    let analyzer = LiveAnalyzer::new(Arc::new(classifier), sampler, config.point_width);
    let mut reader = FrameReader::open(&args.video, &info).context("failed to open video for decoding")?;
    let outcome = analyzer.run(&mut reader).await.context("live analysis failed")?;
    reader.close().await?;

    let timeline = outcome.timeline;
    let compositor = OverlayCompositor::new(config.layout);

    let video = if args.no_render {
        None
    } else {
        let overlays = timeline.to_overlay_intervals_with(&compositor, config.min_overlay_duration);
        let boxes = if config.draw_face_boxes {
            timeline.to_box_directives(config.min_overlay_duration)
        } else {
            Vec::new()
        };
        let path = OverlayRenderer::new(config.render_settings())
            .render(&args.video, &config.live_output, &overlays, &boxes)
            .await
            .context("failed to render annotated video")?;
        Some(path)
    };

    let series = timeline.to_time_series();
    TimelineChartExporter::default()
        .export(&series, &config.chart_output)
        .await
        .context("failed to write emotion chart")?;

    if let Some(path) = &args.series_out {
        super::write_series(&series, path).await?;
    }

    Ok(LiveSummary {
        stats: outcome.stats,
        events: timeline.len(),
        video,
        chart: config.chart_output.clone(),
        series: args.series_out.clone(),
    })
}
