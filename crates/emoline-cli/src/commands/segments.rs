//! `emoline segments`: annotate a video from a segment analysis.

use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use emoline_media::{
    annotated_output_path, OverlayCompositor, OverlayRenderer, SegmentMerger, SegmentPipeline,
    TimelineChartExporter,
};

use crate::cli::SegmentArgs;
use crate::config::PipelineConfig;

/// What a segment run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentSummary {
    pub emotions: usize,
    pub sentiments: usize,
    pub associations: usize,
    pub overlays: usize,
    pub video: Option<PathBuf>,
}

pub async fn run_segments(args: &SegmentArgs, config: &PipelineConfig) -> anyhow::Result<SegmentSummary> {
    if !args.no_render && !args.video.exists() {
        anyhow::bail!("input video not found: {}", args.video.display());
    }

    let analysis = SegmentPipeline::load_analysis(&args.analysis)
        .await
        .with_context(|| format!("failed to load {}", args.analysis.display()))?;

    let pipeline = SegmentPipeline::new(
        SegmentMerger::new(config.join_strategy),
        OverlayCompositor::new(config.layout),
        config.min_overlay_duration,
    );
    let plan = pipeline.plan(&analysis);
    info!(
        emotions = analysis.emotions.len(),
        sentiments = analysis.sentiments.len(),
        associations = plan.associations,
        overlays = plan.overlays.len(),
        "Merged segment streams"
    );

    let video = if args.no_render {
        None
    } else {
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| annotated_output_path(&args.video));
        let path = OverlayRenderer::new(config.render_settings())
            .render(&args.video, &output, &plan.overlays, &[])
            .await
            .context("failed to render annotated video")?;
        Some(path)
    };

    let series = plan.timeline.to_time_series();
    if let Some(path) = &args.chart {
        TimelineChartExporter::default()
            .export(&series, path)
            .await
            .context("failed to write emotion chart")?;
    }
    if let Some(path) = &args.series_out {
        super::write_series(&series, path).await?;
    }

    Ok(SegmentSummary {
        emotions: analysis.emotions.len(),
        sentiments: analysis.sentiments.len(),
        associations: plan.associations,
        overlays: plan.overlays.len(),
        video,
    })
}
