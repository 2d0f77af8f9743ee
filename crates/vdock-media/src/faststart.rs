//! Fast-start container remux.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::command::{check_ffmpeg, run_tool};
use crate::error::{MediaError, MediaResult};

/// Suffix appended to the input path to derive the remux output path.
pub const FASTSTART_SUFFIX: &str = ".processing";

/// Derive the output path for a fast-start remux of `input`.
pub fn faststart_output_path(input: &Path) -> PathBuf {
    let mut os = input.as_os_str().to_os_string();
    os.push(FASTSTART_SUFFIX);
    PathBuf::from(os)
}

/// Remux a local mp4 so its index atoms precede the media payload.
///
/// All streams are copied verbatim; nothing is re-encoded. The output
/// lands next to the input at `{input}.processing` and the caller owns
/// deleting both files. A partially written output is removed before
/// the error is returned, so callers never see a half-remuxed file.
pub async fn remux_faststart(
    input: impl AsRef<Path>,
    timeout_secs: Option<u64>,
) -> MediaResult<PathBuf> {
    let input = input.as_ref();

    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    check_ffmpeg()?;

    let output_path = faststart_output_path(input);
    let args = vec![
        "-y".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-movflags".to_string(),
        "faststart".to_string(),
        "-f".to_string(),
        "mp4".to_string(),
        output_path.to_string_lossy().to_string(),
    ];

    match run_tool("ffmpeg", &args, timeout_secs).await {
        Ok(output) if output.status.success() => {
            info!(
                input = %input.display(),
                output = %output_path.display(),
                "fast-start remux complete"
            );
            Ok(output_path)
        }
        Ok(output) => {
            remove_partial(&output_path).await;
            Err(MediaError::ffmpeg_failed(
                "ffmpeg exited with non-zero status",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
                output.status.code(),
            ))
        }
        Err(e) => {
            remove_partial(&output_path).await;
            Err(e)
        }
    }
}

async fn remove_partial(path: &Path) {
    if tokio::fs::remove_file(path).await.is_ok() {
        debug!(path = %path.display(), "removed partial remux output");
    }
}
