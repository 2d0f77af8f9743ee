#![deny(unreachable_patterns)]
//! FFmpeg/ffprobe CLI wrappers for video ingestion.
//!
//! This crate provides:
//! - Binary preflight checks for ffmpeg and ffprobe
//! - Stream probing with aspect classification
//! - Fast-start container remuxing (stream copy, no re-encode)

pub mod command;
pub mod error;
pub mod faststart;
pub mod probe;

pub use command::{check_ffmpeg, check_ffprobe};
pub use error::{MediaError, MediaResult};
pub use faststart::{faststart_output_path, remux_faststart, FASTSTART_SUFFIX};
pub use probe::{probe_dimensions, StreamDimensions};
