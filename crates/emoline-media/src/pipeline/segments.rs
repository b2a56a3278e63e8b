//! Pre-computed segment analysis.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use emoline_models::{OverlayDirective, SegmentAnalysis};

use crate::compositor::OverlayCompositor;
use crate::error::{MediaError, MediaResult};
use crate::merge::SegmentMerger;
use crate::timeline::{Timeline, TimelineBuilder};

/// Suffix added to the input stem for annotated segment output.
pub const ANNOTATED_SUFFIX: &str = "_with_emotions";

/// Everything needed to render one segment-annotated video.
#[derive(Debug, Clone)]
pub struct SegmentPlan {
    /// Emotion directive followed by its sentiment directives, per segment
    pub overlays: Vec<OverlayDirective>,
    /// Both streams, ordered by start time
    pub timeline: Timeline,
    /// Total emotion/sentiment associations
    pub associations: usize,
    /// Emotions that no sentiment fully contains
    pub unmatched_emotions: usize,
}

/// Merges emotion and sentiment segments into overlay directives.
#[derive(Debug, Clone, Default)]
pub struct SegmentPipeline {
    merger: SegmentMerger,
    compositor: OverlayCompositor,
    min_duration: f64,
}

impl SegmentPipeline {
    pub fn new(merger: SegmentMerger, compositor: OverlayCompositor, min_duration: f64) -> Self {
        Self {
            merger,
            compositor,
            min_duration,
        }
    }

    /// Read and validate a segment-analysis document.
    pub async fn load_analysis(path: impl AsRef<Path>) -> MediaResult<SegmentAnalysis> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }

        let bytes = tokio::fs::read(path).await?;
        let analysis = SegmentAnalysis::from_slice(&bytes)?;
        info!(
            path = %path.display(),
            emotions = analysis.emotions.len(),
            sentiments = analysis.sentiments.len(),
            "Loaded segment analysis"
        );
        Ok(analysis)
    }

    /// Merge both streams and compose the overlays.
    pub fn plan(&self, analysis: &SegmentAnalysis) -> SegmentPlan {
        let merged = self
            .merger
            .merge_containing(&analysis.emotions, &analysis.sentiments);

        let associations = merged.iter().map(|m| m.sentiments.len()).sum();
        let unmatched_emotions = merged.iter().filter(|m| m.sentiments.is_empty()).count();
        if unmatched_emotions > 0 && !analysis.sentiments.is_empty() {
            warn!(
                unmatched = unmatched_emotions,
                "Some emotions are not fully inside any sentiment segment"
            );
        }

        let overlays = self.compositor.compose_all(&merged, self.min_duration);

        let mut builder = TimelineBuilder::new();
        builder.extend(analysis.emotions.iter().cloned());
        builder.extend(analysis.sentiments.iter().cloned());

        SegmentPlan {
            overlays,
            timeline: builder.finish(),
            associations,
            unmatched_emotions,
        }
    }
}

/// `<stem>_with_emotions.<ext>` next to `input`.
pub fn annotated_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, ANNOTATED_SUFFIX, ext.to_string_lossy()),
        None => format!("{}{}", stem, ANNOTATED_SUFFIX),
    };
    input.with_file_name(name)
}
