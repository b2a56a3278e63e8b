//! Command-line arguments.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use emoline_media::JoinStrategy;

use crate::config::PipelineConfig;

#[derive(Parser, Debug)]
#[command(name = "emoline")]
#[command(version)]
#[command(about = "Build emotion timelines over video and burn them in as overlays")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify sampled frames and annotate the video
    Live(LiveArgs),
    /// Annotate a video from a pre-computed segment analysis
    Segments(SegmentArgs),
}

#[derive(Args, Debug, Clone)]
pub struct LiveArgs {
    /// Input video
    pub video: PathBuf,

    /// Annotated video path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Emotion chart path
    #[arg(long)]
    pub chart: Option<PathBuf>,

    /// Also write the time series as JSON
    #[arg(long)]
    pub series_out: Option<PathBuf>,

    /// Classify every n-th frame
    #[arg(long)]
    pub stride: Option<u64>,

    /// Classifier service base URL
    #[arg(long)]
    pub classifier_url: Option<String>,

    /// Place labels above detected faces
    #[arg(long)]
    pub follow_faces: bool,

    /// Skip video rendering; only write the chart and series
    #[arg(long)]
    pub no_render: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SegmentArgs {
    /// Input video
    pub video: PathBuf,

    /// Segment-analysis JSON document
    pub analysis: PathBuf,

    /// Annotated video path [default: <video>_with_emotions.<ext>]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write an emotion chart
    #[arg(long)]
    pub chart: Option<PathBuf>,

    /// Also write the time series as JSON
    #[arg(long)]
    pub series_out: Option<PathBuf>,

    /// Containment join algorithm
    #[arg(long, value_enum)]
    pub join: Option<JoinArg>,

    /// Skip video rendering
    #[arg(long)]
    pub no_render: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinArg {
    Scan,
    Indexed,
}

impl From<JoinArg> for JoinStrategy {
    fn from(arg: JoinArg) -> Self {
        match arg {
            JoinArg::Scan => JoinStrategy::Scan,
            JoinArg::Indexed => JoinStrategy::Indexed,
        }
    }
}

impl LiveArgs {
    /// Apply flags on top of environment configuration.
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(stride) = self.stride {
            config.sample_stride = stride;
        }
        if let Some(output) = &self.output {
            config.live_output = output.clone();
        }
        if let Some(chart) = &self.chart {
            config.chart_output = chart.clone();
        }
        if self.follow_faces {
            config.layout.follow_faces = true;
        }
    }
}

impl SegmentArgs {
    /// Apply flags on top of environment configuration.
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(join) = self.join {
            config.join_strategy = join.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_live() {
        let cli = Cli::try_parse_from([
            "emoline", "live", "talk.mp4", "--stride", "10", "--series-out", "series.json",
        ])
        .unwrap();
        let Command::Live(args) = cli.command else {
            panic!("expected live subcommand");
        };
        assert_eq!(args.video, PathBuf::from("talk.mp4"));

        let mut config = PipelineConfig::default();
        args.apply(&mut config);
        assert_eq!(config.sample_stride, 10);
        assert_eq!(config.live_output, PathBuf::from("analyzed_output.mp4"));
        assert_eq!(args.series_out, Some(PathBuf::from("series.json")));
    }

    #[test]
    fn test_parse_segments() {
        let cli = Cli::try_parse_from([
            "emoline", "segments", "talk.mov", "insights.json", "--join", "scan",
        ])
        .unwrap();
        let Command::Segments(args) = cli.command else {
            panic!("expected segments subcommand");
        };
        let mut config = PipelineConfig::default();
        args.apply(&mut config);
        assert_eq!(config.join_strategy, JoinStrategy::Scan);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_segments_requires_analysis() {
        assert!(Cli::try_parse_from(["emoline", "segments", "talk.mov"]).is_err());
    }
}
