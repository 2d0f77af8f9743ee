//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while probing or remuxing media files.
#[derive(Debug, Error)]
pub enum MediaError {
    /// ffmpeg is not installed or not on PATH.
    #[error("ffmpeg not found on PATH")]
    FfmpegNotFound,

    /// ffprobe is not installed or not on PATH.
    #[error("ffprobe not found on PATH")]
    FfprobeNotFound,

    /// The input path does not exist.
    #[error("Input file not found: {0}")]
    FileNotFound(PathBuf),

    /// ffprobe exited unsuccessfully or produced no usable output.
    #[error("ffprobe failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    /// The container holds no video stream to measure.
    #[error("No video stream in input")]
    NoVideoStream,

    /// ffmpeg exited unsuccessfully.
    #[error("ffmpeg failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    /// The subprocess outlived its deadline and was killed.
    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn ffprobe_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::FfprobeFailed {
            message: message.into(),
            stderr,
        }
    }
}
