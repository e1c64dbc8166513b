//! Amplitude-based silence segmentation.
//!
//! Splits an audio track into the ordered speech intervals that the dubbing
//! pipeline processes. A "silence" is any maximal span whose RMS level stays
//! at or below a dBFS threshold for at least a minimum duration; everything
//! between qualifying silences is speech. Short dips below the threshold are
//! merged into the surrounding speech.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::extract::PIPELINE_SAMPLE_RATE;

/// Window size for the amplitude envelope.
const WINDOW_MS: u64 = 10;

/// Configuration for silence detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SilenceConfig {
    /// Minimum silence duration before a span separates segments (ms).
    pub min_silence_ms: u64,

    /// Level at or below which a window counts as silent (dBFS, negative).
    pub silence_threshold_dbfs: f32,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            min_silence_ms: 700,
            silence_threshold_dbfs: -40.0,
        }
    }
}

/// One detected speech interval, in track milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechRange {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl SpeechRange {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Detect speech ranges in mono f32 samples.
///
/// Returns an empty vector when the track contains no speech at all; the
/// caller treats that as `NoSpeechDetected`, not as an empty success.
pub fn detect_speech_ranges(
    samples: &[f32],
    sample_rate: u32,
    config: &SilenceConfig,
) -> Vec<SpeechRange> {
    if samples.is_empty() {
        return Vec::new();
    }

    let window_len = (sample_rate as u64 * WINDOW_MS / 1000).max(1) as usize;
    let total_ms = samples.len() as u64 * 1000 / sample_rate as u64;

    // Amplitude envelope: one silent/loud flag per window. The trailing
    // partial window is judged on whatever samples it has.
    let silent_windows: Vec<bool> = samples
        .chunks(window_len)
        .map(|w| window_dbfs(w) <= config.silence_threshold_dbfs)
        .collect();

    // Maximal silent runs that are long enough to separate segments.
    let mut qualifying_silences: Vec<(u64, u64)> = Vec::new();
    let mut run_start: Option<usize> = None;
    for (i, &silent) in silent_windows.iter().enumerate() {
        match (run_start, silent) {
            (None, true) => run_start = Some(i),
            (Some(start), false) => {
                push_if_qualifying(&mut qualifying_silences, start, i, total_ms, config);
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        push_if_qualifying(
            &mut qualifying_silences,
            start,
            silent_windows.len(),
            total_ms,
            config,
        );
    }

    // Speech is the complement of the qualifying silences.
    let mut ranges = Vec::new();
    let mut cursor = 0u64;
    for &(sil_start, sil_end) in &qualifying_silences {
        if sil_start > cursor {
            ranges.push(SpeechRange {
                start_ms: cursor,
                end_ms: sil_start,
            });
        }
        cursor = sil_end;
    }
    if cursor < total_ms {
        ranges.push(SpeechRange {
            start_ms: cursor,
            end_ms: total_ms,
        });
    }

    // A track that is one long qualifying silence has no speech; a track with
    // no qualifying silence at all is one segment only if something is loud.
    if qualifying_silences.is_empty() && silent_windows.iter().all(|&s| s) {
        return Vec::new();
    }

    ranges
}

fn push_if_qualifying(
    silences: &mut Vec<(u64, u64)>,
    start_window: usize,
    end_window: usize,
    total_ms: u64,
    config: &SilenceConfig,
) {
    let start_ms = start_window as u64 * WINDOW_MS;
    let end_ms = (end_window as u64 * WINDOW_MS).min(total_ms);
    if end_ms.saturating_sub(start_ms) >= config.min_silence_ms {
        silences.push((start_ms, end_ms));
    }
}

/// RMS level of one window in dBFS, with 1.0 as full scale. A digitally
/// silent window maps to a floor well below any usable threshold.
fn window_dbfs(window: &[f32]) -> f32 {
    if window.is_empty() {
        return f32::NEG_INFINITY;
    }
    let sum_sq: f64 = window.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let rms = (sum_sq / window.len() as f64).sqrt();
    if rms <= 0.0 {
        f32::NEG_INFINITY
    } else {
        (20.0 * rms.log10()) as f32
    }
}

/// Segment an audio file on disk.
///
/// Decodes to raw mono f32 at the pipeline sample rate via FFmpeg, then runs
/// [`detect_speech_ranges`] over the samples.
pub async fn segment_audio_file(
    audio: impl AsRef<Path>,
    config: &SilenceConfig,
) -> MediaResult<Vec<SpeechRange>> {
    let audio = audio.as_ref();

    let temp_raw = NamedTempFile::new()?;
    let cmd = FfmpegCommand::new(audio, temp_raw.path())
        .no_video()
        .sample_rate(PIPELINE_SAMPLE_RATE)
        .mono()
        .format("f32le");
    FfmpegRunner::new().run(&cmd).await?;

    let bytes = tokio::fs::read(temp_raw.path()).await?;
    if bytes.is_empty() {
        return Err(MediaError::InvalidMedia(format!(
            "no audio data decoded from {}",
            audio.display()
        )));
    }

    let samples: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    let ranges = detect_speech_ranges(&samples, PIPELINE_SAMPLE_RATE, config);
    debug!(
        audio = %audio.display(),
        segments = ranges.len(),
        "Silence segmentation complete"
    );
    Ok(ranges)
}
