//! Frame sources.
//!
//! [`FrameReader`] decodes a video through an FFmpeg `rawvideo` pipe and
//! yields RGB24 frames in decode order with 0-based indices.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use emoline_models::RasterFrame;

use crate::command::check_ffmpeg;
use crate::error::{MediaError, MediaResult};
use crate::probe::VideoInfo;

/// A sequential source of decoded frames.
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame in decode order, or `None` at end of stream.
    async fn next_frame(&mut self) -> MediaResult<Option<RasterFrame>>;
}

/// Decodes a video file with FFmpeg.
///
/// The decoder child is spawned with `kill_on_drop`, so dropping the reader
/// on any path terminates it.
pub struct FrameReader {
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr_task: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    next_index: u64,
    finished: bool,
}

impl FrameReader {
    /// Start decoding `path` at its native resolution.
    pub fn open(path: impl AsRef<Path>, info: &VideoInfo) -> MediaResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        check_ffmpeg()?;

        let mut child = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-i"])
            .arg(path)
            .args(["-map", "0:v:0", "-pix_fmt", "rgb24", "-f", "rawvideo", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::decode_failed("FFmpeg stdout not captured"))?;
        let stderr_task = child.stderr.take().map(|stderr| tokio::spawn(drain_to_string(stderr)));

        debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            "Opened frame reader"
        );

        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            stderr_task,
            width: info.width,
            height: info.height,
            next_index: 0,
            finished: false,
        })
    }

    /// Frames read so far.
    pub fn frames_read(&self) -> u64 {
        self.next_index
    }

    /// Stop decoding early and reap the child.
    pub async fn close(mut self) -> MediaResult<()> {
        if !self.finished {
            let _ = self.child.kill().await;
            self.finished = true;
        }
        Ok(())
    }

    async fn finish(&mut self) -> MediaResult<()> {
        self.finished = true;
        let status = self.child.wait().await?;
        let stderr = match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if status.success() {
            debug!(frames = self.next_index, "Frame reader reached end of stream");
            Ok(())
        } else {
            Err(MediaError::decode_failed(format!(
                "FFmpeg decoder exited with {:?}: {}",
                status.code(),
                stderr.trim()
            )))
        }
    }
}

#[async_trait]
impl FrameSource for FrameReader {
    async fn next_frame(&mut self) -> MediaResult<Option<RasterFrame>> {
        if self.finished {
            return Ok(None);
        }

        let frame_len = RasterFrame::byte_len(self.width, self.height);
        let mut data = vec![0u8; frame_len];
        let filled = read_full(&mut self.stdout, &mut data).await?;

        if filled < frame_len {
            if filled > 0 {
                warn!(
                    frame_idx = self.next_index,
                    bytes = filled,
                    expected = frame_len,
                    "Discarding truncated trailing frame"
                );
            }
            self.finish().await?;
            return Ok(None);
        }

        let frame = RasterFrame {
            index: self.next_index,
            width: self.width,
            height: self.height,
            data,
        };
        self.next_index += 1;
        Ok(Some(frame))
    }
}

/// Fill `buf` from `reader`, returning how many bytes were read before EOF.
async fn read_full<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> MediaResult<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

async fn drain_to_string<R: AsyncRead + Unpin>(mut reader: R) -> String {
    let mut out = String::new();
    let _ = reader.read_to_string(&mut out).await;
    out
}

/// Frames held in memory. Used for tests and pre-decoded input.
#[derive(Debug, Default)]
pub struct MemoryFrameSource {
    frames: VecDeque<RasterFrame>,
}

impl MemoryFrameSource {
    pub fn new(frames: impl IntoIterator<Item = RasterFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// `count` blank frames of the given size, indexed from 0.
    pub fn blank(count: u64, width: u32, height: u32) -> Self {
        Self::new((0..count).map(|index| RasterFrame {
            index,
            width,
            height,
            data: vec![0; RasterFrame::byte_len(width, height)],
        }))
    }
}

#[async_trait]
impl FrameSource for MemoryFrameSource {
    async fn next_frame(&mut self) -> MediaResult<Option<RasterFrame>> {
        Ok(self.frames.pop_front())
    }
}
