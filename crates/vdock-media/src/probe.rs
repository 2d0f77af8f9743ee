//! FFprobe stream inspection.

use serde::Deserialize;
use std::path::Path;

use vdock_models::AspectClass;

use crate::command::{check_ffprobe, run_tool};
use crate::error::{MediaError, MediaResult};

/// Frame dimensions of the first video stream in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl StreamDimensions {
    /// Classify into the coarse orientation bucket.
    pub fn aspect_class(&self) -> AspectClass {
        AspectClass::classify(self.width, self.height)
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Probe a local file for the dimensions of its first video stream.
///
/// Read-only; the input file is never touched. Fails with
/// [`MediaError::NoVideoStream`] when the file has no video stream at
/// all (audio-only containers).
pub async fn probe_dimensions(
    path: impl AsRef<Path>,
    timeout_secs: Option<u64>,
) -> MediaResult<StreamDimensions> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let args = vec![
        "-v".to_string(),
        "error".to_string(),
        "-print_format".to_string(),
        "json".to_string(),
        "-show_streams".to_string(),
        path.to_string_lossy().to_string(),
    ];

    let output = run_tool("ffprobe", &args, timeout_secs).await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            "ffprobe exited with non-zero status",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    dimensions_from_streams(&probe.streams)
}

fn dimensions_from_streams(streams: &[FfprobeStream]) -> MediaResult<StreamDimensions> {
    let video = streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or(MediaError::NoVideoStream)?;

    match (video.width, video.height) {
        (Some(width), Some(height)) => Ok(StreamDimensions { width, height }),
        _ => Err(MediaError::ffprobe_failed(
            "video stream is missing width/height",
            None,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> MediaResult<StreamDimensions> {
        let probe: FfprobeOutput = serde_json::from_str(json).unwrap();
        dimensions_from_streams(&probe.streams)
    }

    #[test]
    fn test_reads_first_video_stream() {
        let dims = parse(
            r#"{"streams": [
                {"codec_type": "audio"},
                {"codec_type": "video", "width": 1920, "height": 1080},
                {"codec_type": "video", "width": 640, "height": 480}
            ]}"#,
        )
        .unwrap();
        assert_eq!(dims.width, 1920);
        assert_eq!(dims.height, 1080);
        assert_eq!(dims.aspect_class(), AspectClass::Landscape);
    }

    #[test]
    fn test_audio_only_file_has_no_video_stream() {
        let result = parse(r#"{"streams": [{"codec_type": "audio"}]}"#);
        assert!(matches!(result, Err(MediaError::NoVideoStream)));
    }

    #[test]
    fn test_empty_stream_list_has_no_video_stream() {
        let result = parse(r#"{"streams": []}"#);
        assert!(matches!(result, Err(MediaError::NoVideoStream)));
    }

    #[test]
    fn test_stream_without_dimensions_is_a_probe_failure() {
        let result = parse(r#"{"streams": [{"codec_type": "video"}]}"#);
        assert!(matches!(result, Err(MediaError::FfprobeFailed { .. })));
    }

    #[test]
    fn test_portrait_dimensions_classify_portrait() {
        let dims = parse(
            r#"{"streams": [{"codec_type": "video", "width": 1080, "height": 1920}]}"#,
        )
        .unwrap();
        assert_eq!(dims.aspect_class(), AspectClass::Portrait);
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let result = probe_dimensions("/nonexistent/clip.mp4", None).await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
