//! Atomic output finalization.
//!
//! Every artifact is first written to a temporary file in its destination
//! directory, then renamed into place. If the run fails before that rename,
//! the temporary file is removed on drop and the destination is untouched.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempPath};

use crate::error::{MediaError, MediaResult};

/// A not-yet-finalized output file.
///
/// The temporary path keeps the target's extension so FFmpeg can pick the
/// right muxer from it.
#[derive(Debug)]
pub struct PendingOutput {
    temp: TempPath,
    target: PathBuf,
}

impl PendingOutput {
    /// Reserve a temporary file next to `target`.
    pub fn new(target: impl AsRef<Path>) -> MediaResult<Self> {
        let target = target.as_ref().to_path_buf();
        let dir = parent_dir(&target);
        std::fs::create_dir_all(&dir)?;

        let suffix = target
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let temp = Builder::new()
            .prefix(".emoline-")
            .suffix(&suffix)
            .tempfile_in(&dir)?
            .into_temp_path();

        Ok(Self { temp, target })
    }

    /// Path the producer should write to.
    pub fn path(&self) -> &Path {
        &self.temp
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Move the finished file into place.
    pub fn commit(self) -> MediaResult<PathBuf> {
        let Self { temp, target } = self;
        temp.persist(&target).map_err(|e| MediaError::Io(e.error))?;
        tracing::debug!(path = %target.display(), "Finalized output");
        Ok(target)
    }
}

/// Write `bytes` to `path` atomically.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> MediaResult<()> {
    let path = path.to_path_buf();
    let bytes = bytes.to_vec();

    tokio::task::spawn_blocking(move || -> MediaResult<()> {
        let pending = PendingOutput::new(&path)?;
        let mut file = std::fs::File::create(pending.path())?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);
        pending.commit()?;
        Ok(())
    })
    .await
    .map_err(|e| MediaError::Io(std::io::Error::other(e)))?
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pending_output_commit() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.mp4");

        let pending = PendingOutput::new(&target).unwrap();
        assert!(pending.path().to_string_lossy().ends_with(".mp4"));
        std::fs::write(pending.path(), b"video").unwrap();

        let committed = pending.commit().unwrap();
        assert_eq!(committed, target);
        assert_eq!(std::fs::read(&target).unwrap(), b"video");
    }

    #[test]
    fn test_pending_output_dropped_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.mp4");

        let temp_path = {
            let pending = PendingOutput::new(&target).unwrap();
            std::fs::write(pending.path(), b"partial").unwrap();
            pending.path().to_path_buf()
        };

        assert!(!temp_path.exists());
        assert!(!target.exists());
    }

    #[test]
    fn test_pending_output_creates_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("chart.png");
        let pending = PendingOutput::new(&target).unwrap();
        assert!(dir.path().join("nested").is_dir());
        drop(pending);
    }

    #[tokio::test]
    async fn test_write_atomic_overwrites() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("series.json");
        std::fs::write(&target, b"old").unwrap();

        write_atomic(&target, b"new").await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"new");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
