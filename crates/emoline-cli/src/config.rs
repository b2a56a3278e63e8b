//! Pipeline configuration.

use std::path::PathBuf;
use std::str::FromStr;

use emoline_media::{JoinStrategy, OverlayLayout, RenderSettings, TextStyle, DEFAULT_SAMPLE_STRIDE};
use emoline_models::DEFAULT_POINT_WIDTH_SECS;

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Classify every n-th decoded frame
    pub sample_stride: u64,
    /// Width given to point detections, in seconds
    pub point_width: f64,
    /// Shortest overlay shown on screen, in seconds
    pub min_overlay_duration: f64,
    pub video_codec: String,
    pub audio_codec: String,
    /// Annotated video written by the live pipeline
    pub live_output: PathBuf,
    /// Emotion chart written by the live pipeline
    pub chart_output: PathBuf,
    pub font_size: u32,
    pub font_file: Option<String>,
    pub layout: OverlayLayout,
    pub join_strategy: JoinStrategy,
    /// Draw face rectangles in live output
    pub draw_face_boxes: bool,
    /// Kill FFmpeg renders that run longer than this
    pub render_timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            point_width: DEFAULT_POINT_WIDTH_SECS,
            min_overlay_duration: 0.2,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            live_output: PathBuf::from("analyzed_output.mp4"),
            chart_output: PathBuf::from("emotion_graph.png"),
            font_size: 32,
            font_file: None,
            layout: OverlayLayout::default(),
            join_strategy: JoinStrategy::default(),
            draw_face_boxes: true,
            render_timeout_secs: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup. Unset or unparseable
    /// values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse = |key: &str| lookup(key);

        Self {
            sample_stride: parsed(&parse, "EMOLINE_SAMPLE_STRIDE")
                .filter(|s: &u64| *s >= 1)
                .unwrap_or(defaults.sample_stride),
            point_width: parsed(&parse, "EMOLINE_POINT_WIDTH")
                .filter(|w: &f64| *w > 0.0)
                .unwrap_or(defaults.point_width),
            min_overlay_duration: parsed(&parse, "EMOLINE_MIN_OVERLAY_SECS")
                .filter(|d: &f64| *d >= 0.0)
                .unwrap_or(defaults.min_overlay_duration),
            video_codec: parse("EMOLINE_VIDEO_CODEC").unwrap_or(defaults.video_codec),
            audio_codec: parse("EMOLINE_AUDIO_CODEC").unwrap_or(defaults.audio_codec),
            live_output: parse("EMOLINE_LIVE_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or(defaults.live_output),
            chart_output: parse("EMOLINE_CHART_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or(defaults.chart_output),
            font_size: parsed(&parse, "EMOLINE_FONT_SIZE").unwrap_or(defaults.font_size),
            font_file: parse("EMOLINE_FONT_FILE").or(defaults.font_file),
            layout: OverlayLayout {
                emotion_offset: parsed(&parse, "EMOLINE_EMOTION_OFFSET")
                    .unwrap_or(defaults.layout.emotion_offset),
                sentiment_offset: parsed(&parse, "EMOLINE_SENTIMENT_OFFSET")
                    .unwrap_or(defaults.layout.sentiment_offset),
                line_spacing: parsed(&parse, "EMOLINE_LINE_SPACING")
                    .unwrap_or(defaults.layout.line_spacing),
                follow_faces: parse_bool(parse("EMOLINE_FOLLOW_FACES"))
                    .unwrap_or(defaults.layout.follow_faces),
            },
            join_strategy: parse("EMOLINE_JOIN_STRATEGY")
                .and_then(|s| parse_join_strategy(&s))
                .unwrap_or(defaults.join_strategy),
            draw_face_boxes: parse_bool(parse("EMOLINE_DRAW_FACE_BOXES"))
                .unwrap_or(defaults.draw_face_boxes),
            render_timeout_secs: parsed(&parse, "EMOLINE_RENDER_TIMEOUT").or(defaults.render_timeout_secs),
        }
    }

    /// Encoder settings for the overlay renderer.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            video_codec: self.video_codec.clone(),
            audio_codec: self.audio_codec.clone(),
            style: TextStyle {
                font_size: self.font_size,
                font_file: self.font_file.clone(),
                ..TextStyle::default()
            },
            timeout_secs: self.render_timeout_secs,
        }
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|s| s.trim().parse().ok())
}

fn parse_bool(value: Option<String>) -> Option<bool> {
    match value?.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `scan` or `indexed`, case-insensitive.
pub fn parse_join_strategy(value: &str) -> Option<JoinStrategy> {
    match value.trim().to_lowercase().as_str() {
        "scan" => Some(JoinStrategy::Scan),
        "indexed" => Some(JoinStrategy::Indexed),
        _ => None,
    }
}
