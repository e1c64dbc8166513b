//! Remote video download via yt-dlp.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

use crate::command::check_ytdlp;
use crate::error::{MediaError, MediaResult};

/// Format selection: best mp4 video up to 1080p with m4a audio, merged to mp4.
const FORMAT_SELECTOR: &str =
    "bestvideo[ext=mp4][height<=1080]+bestaudio[ext=m4a]/best[ext=mp4][height<=1080]/best";

/// How much of yt-dlp's stderr to surface in error messages.
const STDERR_TAIL_CHARS: usize = 200;

/// Download a remote video to `dest` as mp4.
pub async fn download_video(url: &str, dest: impl AsRef<Path>) -> MediaResult<()> {
    let dest = dest.as_ref();
    check_ytdlp()?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    info!(url, dest = %dest.display(), "Downloading video with yt-dlp");

    let output = Command::new("yt-dlp")
        .args([
            "-f",
            FORMAT_SELECTOR,
            "--merge-output-format",
            "mp4",
            "--socket-timeout",
            "30",
            "--no-playlist",
            "-o",
        ])
        .arg(dest)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: String = stderr.chars().rev().take(STDERR_TAIL_CHARS).collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        warn!(url, "yt-dlp failed: {}", tail.trim());
        return Err(MediaError::download_failed(format!(
            "yt-dlp exited with {:?}: {}",
            output.status.code(),
            tail.trim()
        )));
    }

    // yt-dlp can exit zero without writing anything for some URL classes.
    match tokio::fs::metadata(dest).await {
        Ok(m) if m.len() > 0 => Ok(()),
        _ => Err(MediaError::download_failed(format!(
            "yt-dlp produced no output for {url}"
        ))),
    }
}
