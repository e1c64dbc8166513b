//! Audio/video remuxing.

use std::path::Path;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Replace a video's audio track with a new one, writing a fresh file.
///
/// The source video is never mutated. Encoding happens into a temporary file
/// next to the destination and is renamed into place only on success, so a
/// failed encode leaves no partial deliverable behind.
pub async fn replace_audio(
    video: impl AsRef<Path>,
    audio: impl AsRef<Path>,
    out: impl AsRef<Path>,
) -> MediaResult<()> {
    let video = video.as_ref();
    let audio = audio.as_ref();
    let out = out.as_ref();

    if !video.exists() {
        return Err(MediaError::FileNotFound(video.to_path_buf()));
    }
    if !audio.exists() {
        return Err(MediaError::FileNotFound(audio.to_path_buf()));
    }

    let out_dir = out.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(out_dir).await?;

    // tempfile removes the intermediate on every exit path; keep() is only
    // reached after a successful encode.
    let temp = tempfile::Builder::new()
        .prefix(".mux-")
        .suffix(".mp4")
        .tempfile_in(out_dir)?;

    info!(
        video = %video.display(),
        audio = %audio.display(),
        out = %out.display(),
        "Muxing replacement audio track"
    );

    let cmd = FfmpegCommand::new(video, temp.path())
        .add_input(audio)
        .output_args(["-map", "0:v:0", "-map", "1:a:0"])
        .output_args(["-c:v", "copy"])
        .audio_codec("aac")
        .format("mp4");

    FfmpegRunner::new().run(&cmd).await?;

    let metadata = tokio::fs::metadata(temp.path()).await?;
    if metadata.len() == 0 {
        return Err(MediaError::ffmpeg_failed(
            "mux produced an empty file",
            None,
            None,
        ));
    }

    let temp_path = temp.keep().map_err(|e| e.error)?.1;
    tokio::fs::rename(&temp_path, out).await?;

    Ok(())
}
