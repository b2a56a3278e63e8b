//! Error types for timeline and media operations.

use std::path::PathBuf;
use thiserror::Error;

use emoline_models::ModelError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while building timelines or rendering output.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),

    #[error("Sampling stride must be at least 1")]
    InvalidStride,

    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("Render failed: {message}")]
    RenderFailure {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Frame decode failed: {0}")]
    DecodeFailed(String),

    #[error("Chart export failed: {0}")]
    ChartFailed(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a render failure error.
    pub fn render_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::RenderFailure {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a classifier failure error.
    pub fn classifier_unavailable(message: impl Into<String>) -> Self {
        Self::ClassifierUnavailable(message.into())
    }

    /// Create a decode failure error.
    pub fn decode_failed(message: impl Into<String>) -> Self {
        Self::DecodeFailed(message.into())
    }

    /// Whether the live loop may skip the frame and keep going.
    pub fn is_frame_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ClassifierUnavailable(_) | Self::Model(ModelError::InvalidClassification(_))
        )
    }
}
