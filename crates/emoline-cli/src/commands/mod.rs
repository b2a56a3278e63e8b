//! Subcommand implementations.

pub mod live;
pub mod segments;

use anyhow::Context;
use std::path::Path;
use tracing::info;

use emoline_media::TimeSeries;

pub use live::{run_live, LiveSummary};
pub use segments::{run_segments, SegmentSummary};

/// Write `series` as JSON to the `--series-out` path.
pub(crate) async fn write_series(series: &TimeSeries, path: &Path) -> anyhow::Result<()> {
    series
        .write_to_file(path)
        .await
        .with_context(|| format!("failed to write time series to {}", path.display()))?;
    info!(path = %path.display(), rows = series.len(), "Wrote time series");
    Ok(())
}
