//! Audio extraction and segment slicing.

use std::path::Path;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_media;

/// Sample rate every intermediate wav in the pipeline uses. Keeping the
/// master track, the chunks and the reconstructed timeline at one rate means
/// sample counts convert to milliseconds without rounding surprises.
pub const PIPELINE_SAMPLE_RATE: u32 = 16_000;

/// Extract the audio track of a video into a mono 16-bit PCM wav.
///
/// Fails with [`MediaError::NoAudioTrack`] when the container has no audio
/// stream at all.
pub async fn extract_audio(video: impl AsRef<Path>, wav_out: impl AsRef<Path>) -> MediaResult<()> {
    let video = video.as_ref();
    let wav_out = wav_out.as_ref();

    let info = probe_media(video).await?;
    if !info.has_audio {
        return Err(MediaError::NoAudioTrack(video.to_path_buf()));
    }

    info!(
        video = %video.display(),
        wav = %wav_out.display(),
        "Extracting audio track"
    );

    let cmd = FfmpegCommand::new(video, wav_out)
        .no_video()
        .audio_codec("pcm_s16le")
        .sample_rate(PIPELINE_SAMPLE_RATE)
        .mono();

    FfmpegRunner::new().run(&cmd).await?;

    let metadata = tokio::fs::metadata(wav_out).await?;
    if metadata.len() == 0 {
        return Err(MediaError::NoAudioTrack(video.to_path_buf()));
    }

    Ok(())
}

/// Slice `[start_ms, end_ms)` out of the master wav into a standalone chunk.
pub async fn slice_clip(
    master_wav: impl AsRef<Path>,
    chunk_out: impl AsRef<Path>,
    start_ms: u64,
    end_ms: u64,
) -> MediaResult<()> {
    let master_wav = master_wav.as_ref();
    let chunk_out = chunk_out.as_ref();

    if end_ms <= start_ms {
        return Err(MediaError::InvalidMedia(format!(
            "empty slice [{start_ms}, {end_ms})"
        )));
    }

    let cmd = FfmpegCommand::new(master_wav, chunk_out)
        .seek_ms(start_ms)
        .duration_ms(end_ms - start_ms)
        .audio_codec("pcm_s16le");

    FfmpegRunner::new().run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slice_rejects_empty_interval() {
        let err = slice_clip("in.wav", "out.wav", 500, 500).await.unwrap_err();
        assert!(matches!(err, MediaError::InvalidMedia(_)));
    }
}
