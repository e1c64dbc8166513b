//! Timeline reconstruction: silence gaps plus synthesized clips.
//!
//! The reconstructed track starts empty; for each segment in index order the
//! pipeline appends the segment's original silence gap and then, if synthesis
//! produced one, the synthesized clip. Synthesized durations are not
//! stretched to match the original speech, only the gaps preserve pacing.

use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::extract::PIPELINE_SAMPLE_RATE;

/// Accumulator for the reconstructed audio track, mono 16-bit PCM.
pub struct Timeline {
    sample_rate: u32,
    samples: Vec<i16>,
    /// Count of appended clips, to distinguish "all silence" from "no audio".
    clips_appended: usize,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(PIPELINE_SAMPLE_RATE)
    }
}

impl Timeline {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: Vec::new(),
            clips_appended: 0,
        }
    }

    /// Append `ms` of digital silence.
    pub fn push_silence(&mut self, ms: u64) {
        let n = (self.sample_rate as u64 * ms / 1000) as usize;
        self.samples.resize(self.samples.len() + n, 0);
    }

    /// Append decoded samples directly. Counts as a clip.
    pub fn push_samples(&mut self, samples: &[i16]) {
        self.samples.extend_from_slice(samples);
        self.clips_appended += 1;
    }

    /// Decode an audio file (any container FFmpeg reads) and append it.
    /// Returns the clip duration in milliseconds.
    pub async fn push_clip(&mut self, clip: impl AsRef<Path>) -> MediaResult<u64> {
        let clip = clip.as_ref();

        let temp_raw = NamedTempFile::new()?;
        let cmd = FfmpegCommand::new(clip, temp_raw.path())
            .no_video()
            .sample_rate(self.sample_rate)
            .mono()
            .format("s16le");
        FfmpegRunner::new().run(&cmd).await?;

        let bytes = tokio::fs::read(temp_raw.path()).await?;
        if bytes.is_empty() {
            return Err(MediaError::InvalidMedia(format!(
                "decoded no samples from {}",
                clip.display()
            )));
        }

        let decoded: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        let clip_ms = decoded.len() as u64 * 1000 / self.sample_rate as u64;
        self.push_samples(&decoded);

        debug!(clip = %clip.display(), clip_ms, "Appended clip to timeline");
        Ok(clip_ms)
    }

    /// Total duration so far, in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }

    /// Whether any clip contributed audio. A timeline of gaps only means
    /// every segment was skipped or failed.
    pub fn has_audio(&self) -> bool {
        self.clips_appended > 0
    }

    /// Encode the accumulated track as mp3.
    pub async fn export_mp3(&self, out: impl AsRef<Path>) -> MediaResult<()> {
        let out = out.as_ref();

        let mut temp_raw = NamedTempFile::new()?;
        {
            use std::io::Write;
            let mut bytes = Vec::with_capacity(self.samples.len() * 2);
            for s in &self.samples {
                bytes.extend_from_slice(&s.to_le_bytes());
            }
            temp_raw.write_all(&bytes)?;
            temp_raw.flush()?;
        }

        let cmd = FfmpegCommand::new(temp_raw.path(), out)
            .input_arg("-f")
            .input_arg("s16le")
            .input_arg("-ar")
            .input_arg(self.sample_rate.to_string())
            .input_arg("-ac")
            .input_arg("1")
            .audio_codec("libmp3lame");
        FfmpegRunner::new().run(&cmd).await?;

        debug!(
            out = %out.display(),
            duration_ms = self.duration_ms(),
            "Reconstructed track exported"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_timeline() {
        let t = Timeline::new(16_000);
        assert_eq!(t.duration_ms(), 0);
        assert!(!t.has_audio());
    }

    #[test]
    fn test_silence_duration_exact() {
        let mut t = Timeline::new(16_000);
        t.push_silence(1000);
        t.push_silence(337);
        assert_eq!(t.duration_ms(), 1337);
        assert!(!t.has_audio());
    }

    #[test]
    fn test_gaps_plus_clips_sum() {
        // Reconstructed duration = sum of gaps + sum of clip durations.
        let mut t = Timeline::new(16_000);
        t.push_silence(500);
        t.push_samples(&vec![100i16; 16_000]); // 1000 ms
        t.push_silence(250);
        t.push_samples(&vec![-100i16; 8_000]); // 500 ms
        assert_eq!(t.duration_ms(), 500 + 1000 + 250 + 500);
        assert!(t.has_audio());
    }

    #[test]
    fn test_skipped_segment_contributes_gap_only() {
        let mut t = Timeline::new(16_000);
        t.push_silence(1000); // segment skipped at synthesis
        t.push_silence(200);
        t.push_samples(&vec![1i16; 1600]); // 100 ms
        assert_eq!(t.duration_ms(), 1300);
        assert!(t.has_audio());
    }
}
