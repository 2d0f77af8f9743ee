//! Subprocess plumbing shared by the probe and remux wrappers.

use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

/// Run a media tool to completion, capturing stdout and stderr.
///
/// With a timeout set, the child is killed once the deadline passes.
/// The child also dies if the returned future is dropped (client
/// disconnect), so an abandoned request cannot leave a stray process.
pub(crate) async fn run_tool(
    program: &str,
    args: &[String],
    timeout_secs: Option<u64>,
) -> MediaResult<Output> {
    debug!("running {} {}", program, args.join(" "));

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let wait = child.wait_with_output();
    match timeout_secs {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), wait).await {
            Ok(output) => Ok(output?),
            Err(_) => {
                warn!("{} timed out after {} seconds, killing process", program, secs);
                Err(MediaError::Timeout(secs))
            }
        },
        None => Ok(wait.await?),
    }
}
