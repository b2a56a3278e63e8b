//! Overlay rendering through FFmpeg.

use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use emoline_models::{BoxDirective, OverlayDirective};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{build_overlay_graph, TextStyle};
use crate::fs_utils::PendingOutput;
use crate::metrics;

/// Encoder and styling settings for annotated output.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub video_codec: String,
    pub audio_codec: String,
    pub style: TextStyle,
    /// Kill FFmpeg after this many seconds
    pub timeout_secs: Option<u64>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            style: TextStyle::default(),
            timeout_secs: None,
        }
    }
}

/// Draws overlay directives onto a video in one encode pass.
#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer {
    settings: RenderSettings,
}

impl OverlayRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Render `overlays` and `boxes` onto `input`, writing `output`.
    ///
    /// The source audio stream is carried over when present. `output` only
    /// appears once FFmpeg has succeeded; on failure nothing is left behind.
    pub async fn render(
        &self,
        input: &Path,
        output: &Path,
        overlays: &[OverlayDirective],
        boxes: &[BoxDirective],
    ) -> MediaResult<PathBuf> {
        if !input.exists() {
            return Err(MediaError::FileNotFound(input.to_path_buf()));
        }
        if input == output {
            return Err(MediaError::InvalidVideo(format!(
                "output would overwrite input: {}",
                input.display()
            )));
        }

        let graph = build_overlay_graph(overlays, boxes, &self.settings.style);
        let script = tempfile::Builder::new()
            .prefix("emoline-filter-")
            .suffix(".txt")
            .tempfile()?;
        tokio::fs::write(script.path(), graph.as_bytes()).await?;

        let pending = PendingOutput::new(output)?;
        let cmd = FfmpegCommand::new(input, pending.path())
            .video_filter_script(script.path())
            .video_codec(&self.settings.video_codec)
            .audio_codec(&self.settings.audio_codec)
            .map_video_and_audio();

        let mut runner = FfmpegRunner::new();
        if let Some(secs) = self.settings.timeout_secs {
            runner = runner.with_timeout(secs);
        }

        info!(
            input = %input.display(),
            output = %output.display(),
            overlays = overlays.len(),
            boxes = boxes.len(),
            "Rendering annotated video"
        );

        let started = Instant::now();
        runner
            .run_with_progress(&cmd, |p| {
                debug!(frame = p.frame, out_time_us = p.out_time_us, speed = p.speed, "Render progress");
            })
            .await?;

        let path = pending.commit()?;
        let elapsed = started.elapsed().as_secs_f64();
        metrics::record_render(elapsed, overlays.len() + boxes.len());
        info!(path = %path.display(), elapsed_secs = elapsed, "Annotated video written");
        Ok(path)
    }
}
