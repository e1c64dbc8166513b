//! Per-segment processing.
//!
//! Segments are independent: one segment's failure never aborts the others.
//! Export, transcription and translation failures are absorbed into the
//! segment's diagnostic status fields; only the job-level "nothing produced
//! any audio at all" condition escalates.

use std::collections::HashMap;
use tracing::{info, warn};

use vodub_media::{slice_clip, SpeechRange, Timeline};
use vodub_models::{Segment, TargetLocale, VoicePreference};
use vodub_services::{SpeechSynthesizer, TranscriptionService, TranslationService};
use vodub_store::{chunk_wav_name, tts_chunk_name, JobArena};

use crate::config::DubbingConfig;
use crate::error::{PipelineError, PipelineResult};

/// Counts from one synthesis pass, for logging and responses.
#[derive(Debug, Default, Clone, Copy)]
pub struct SynthesisReport {
    pub synthesized: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Analysis phase: export, transcribe and translate every detected range.
///
/// Always returns one [`Segment`] per range, in index order, whatever
/// happened to the individual steps.
pub async fn analyze_segments(
    arena: &JobArena,
    ranges: &[SpeechRange],
    transcriber: &dyn TranscriptionService,
    translator: &dyn TranslationService,
    config: &DubbingConfig,
) -> Vec<Segment> {
    let master = arena.master_audio();
    let mut segments = Vec::with_capacity(ranges.len());
    let mut last_end_ms = 0u64;

    for (index, range) in ranges.iter().enumerate() {
        let silence_before_ms = range.start_ms.saturating_sub(last_end_ms);
        let mut segment = Segment::detected(index, range.start_ms, range.end_ms, silence_before_ms);
        last_end_ms = range.end_ms;

        // Export the interval into a standalone chunk.
        let chunk_path = arena.chunk_wav(index);
        match slice_clip(&master, &chunk_path, range.start_ms, range.end_ms).await {
            Ok(()) => segment.original_audio_chunk_ref = chunk_wav_name(index),
            Err(e) => {
                warn!(index, error = %e, "Chunk export failed, skipping segment");
                segment.transcription_status = format!("export failed: {e}");
                segment.translation_status = "skipped: no audio chunk".to_string();
                segments.push(segment);
                continue;
            }
        }

        // Transcribe. An empty result is a valid outcome, not an error.
        match transcriber
            .transcribe(&chunk_path, &config.source_language)
            .await
        {
            Ok(text) if text.is_empty() => {
                segment.transcription_status = "no speech recognized".to_string();
            }
            Ok(text) => {
                segment.transcribed_text = text;
                segment.transcription_status = "ok".to_string();
            }
            Err(e) => {
                warn!(index, error = %e, "Transcription failed");
                segment.transcription_status = format!("transcription failed: {e}");
            }
        }

        // Translate non-empty source text. Failure stores empty text.
        if segment.transcribed_text.is_empty() {
            segment.translation_status = "skipped: empty source text".to_string();
        } else {
            match translator
                .translate(&segment.transcribed_text, &config.target_locale.language)
                .await
            {
                Ok(translated) => {
                    segment.translated_text = translated;
                    segment.translation_status = "ok".to_string();
                }
                Err(e) => {
                    warn!(index, error = %e, "Translation failed");
                    segment.translation_status = format!("translation failed: {e}");
                }
            }
        }

        segments.push(segment);
    }

    info!(segments = segments.len(), "Analysis phase complete");
    segments
}

/// The text actually sent to synthesis: the reviewer's edit when the index
/// appears in the edit map, else the stored translation. An edit mapped to
/// an empty string explicitly silences the segment.
pub fn effective_text<'a>(segment: &'a Segment, edits: &'a HashMap<usize, String>) -> &'a str {
    match edits.get(&segment.index) {
        Some(edited) => edited,
        None => &segment.translated_text,
    }
}

/// Synthesis phase: produce a clip for every segment with non-empty
/// effective text. Per-segment failures are absorbed; the pass fails only
/// when zero segments produced audio.
pub async fn synthesize_segments(
    arena: &JobArena,
    segments: &mut [Segment],
    edits: &HashMap<usize, String>,
    voice: VoicePreference,
    locale: &TargetLocale,
    synthesizer: &dyn SpeechSynthesizer,
) -> PipelineResult<SynthesisReport> {
    let mut report = SynthesisReport::default();

    for segment in segments.iter_mut() {
        let text = effective_text(segment, edits);
        if text.is_empty() {
            // Intentionally silent, not an error.
            report.skipped += 1;
            segment.synthesized_audio_ref = None;
            continue;
        }
        let text = text.to_string();

        match synthesizer.synthesize(&text, &locale.tag, voice).await {
            Ok(bytes) => {
                let path = arena.tts_chunk(segment.index);
                match tokio::fs::write(&path, &bytes).await {
                    Ok(()) => {
                        segment.synthesized_audio_ref = Some(tts_chunk_name(segment.index));
                        report.synthesized += 1;
                    }
                    Err(e) => {
                        warn!(index = segment.index, error = %e, "Failed to write synthesized clip");
                        segment.synthesized_audio_ref = None;
                        report.failed += 1;
                    }
                }
            }
            Err(e) => {
                warn!(index = segment.index, error = %e, "Synthesis failed for segment");
                segment.synthesized_audio_ref = None;
                report.failed += 1;
            }
        }
    }

    if report.synthesized == 0 {
        return Err(PipelineError::NoAudioGenerated);
    }

    info!(
        synthesized = report.synthesized,
        skipped = report.skipped,
        failed = report.failed,
        "Synthesis phase complete"
    );
    Ok(report)
}

/// Reconstruction phase: silence gap then clip, per segment in index order.
/// Returns the path of the combined track.
pub async fn reconstruct_timeline(
    arena: &JobArena,
    segments: &[Segment],
) -> PipelineResult<std::path::PathBuf> {
    let mut timeline = Timeline::default();

    for segment in segments {
        timeline.push_silence(segment.silence_before_ms);
        if segment.synthesized_audio_ref.is_some() {
            let clip = arena.tts_chunk(segment.index);
            timeline
                .push_clip(&clip)
                .await
                .map_err(|e| PipelineError::ReconstructionFailed(e.to_string()))?;
        }
    }

    if !timeline.has_audio() {
        return Err(PipelineError::NoAudioGenerated);
    }

    let combined = arena.combined_audio();
    timeline
        .export_mp3(&combined)
        .await
        .map_err(|e| PipelineError::ReconstructionFailed(e.to_string()))?;

    info!(
        duration_ms = timeline.duration_ms(),
        combined = %combined.display(),
        "Timeline reconstructed"
    );
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use std::path::Path;
    use vodub_models::JobId;
    use vodub_services::{ServiceError, ServiceResult};
    use vodub_store::JobStore;

    mock! {
        Synth {}

        #[async_trait]
        impl SpeechSynthesizer for Synth {
            async fn synthesize(
                &self,
                text: &str,
                locale: &str,
                preference: VoicePreference,
            ) -> ServiceResult<Vec<u8>>;
        }
    }

    mock! {
        Stt {}

        #[async_trait]
        impl TranscriptionService for Stt {
            async fn transcribe(&self, clip: &Path, language: &str) -> ServiceResult<String>;
        }
    }

    mock! {
        Mt {}

        #[async_trait]
        impl TranslationService for Mt {
            async fn translate(&self, text: &str, target_language: &str) -> ServiceResult<String>;
        }
    }

    async fn arena() -> (tempfile::TempDir, JobArena) {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path().join("jobs"), dir.path().join("out"));
        let arena = store.arena(&JobId::parse("1_test").unwrap());
        arena.ensure().await.unwrap();
        (dir, arena)
    }

    fn segment_with_text(index: usize, translated: &str) -> Segment {
        let mut seg = Segment::detected(index, index as u64 * 2000, index as u64 * 2000 + 1000, 500);
        seg.original_audio_chunk_ref = chunk_wav_name(index);
        seg.translated_text = translated.to_string();
        seg
    }

    #[test]
    fn test_effective_text_prefers_edit() {
        let seg = segment_with_text(0, "original");
        let mut edits = HashMap::new();
        assert_eq!(effective_text(&seg, &edits), "original");

        edits.insert(0, "edited".to_string());
        assert_eq!(effective_text(&seg, &edits), "edited");

        // An explicit empty edit silences the segment.
        edits.insert(0, String::new());
        assert_eq!(effective_text(&seg, &edits), "");
    }

    #[test]
    fn test_effective_text_ignores_other_indices() {
        let seg = segment_with_text(3, "original");
        let mut edits = HashMap::new();
        edits.insert(1, "other".to_string());
        assert_eq!(effective_text(&seg, &edits), "original");
    }

    #[tokio::test]
    async fn test_analyze_absorbs_export_failures() {
        // Master audio does not exist, so every export fails; the segments
        // still come back with timing intact.
        let (_dir, arena) = arena().await;
        let ranges = vec![
            SpeechRange {
                start_ms: 1000,
                end_ms: 4000,
            },
            SpeechRange {
                start_ms: 5000,
                end_ms: 6000,
            },
        ];

        let stt = MockStt::new(); // never called
        let mt = MockMt::new(); // never called

        let segments =
            analyze_segments(&arena, &ranges, &stt, &mt, &DubbingConfig::default()).await;

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].silence_before_ms, 1000);
        assert_eq!(segments[1].silence_before_ms, 1000);
        assert!(!segments[0].has_chunk());
        assert!(segments[0].transcription_status.contains("export failed"));
        assert!(segments[0].translated_text.is_empty());
    }

    #[tokio::test]
    async fn test_synthesize_writes_clips_and_refs() {
        let (_dir, arena) = arena().await;
        let mut segments = vec![segment_with_text(0, "text a"), segment_with_text(1, "text b")];

        let mut synth = MockSynth::new();
        synth
            .expect_synthesize()
            .times(2)
            .returning(|_, _, _| Ok(b"mp3".to_vec()));

        let report = synthesize_segments(
            &arena,
            &mut segments,
            &HashMap::new(),
            VoicePreference::Female,
            &TargetLocale::default(),
            &synth,
        )
        .await
        .unwrap();

        assert_eq!(report.synthesized, 2);
        assert_eq!(segments[0].synthesized_audio_ref.as_deref(), Some("chunk_0_tts.mp3"));
        assert!(arena.tts_chunk(1).exists());
    }

    #[tokio::test]
    async fn test_synthesize_skips_empty_effective_text() {
        let (_dir, arena) = arena().await;
        let mut segments = vec![segment_with_text(0, "keep"), segment_with_text(1, "silence me")];
        let mut edits = HashMap::new();
        edits.insert(1, String::new());

        let mut synth = MockSynth::new();
        synth
            .expect_synthesize()
            .times(1)
            .returning(|_, _, _| Ok(b"mp3".to_vec()));

        let report = synthesize_segments(
            &arena,
            &mut segments,
            &edits,
            VoicePreference::Female,
            &TargetLocale::default(),
            &synth,
        )
        .await
        .unwrap();

        assert_eq!(report.synthesized, 1);
        assert_eq!(report.skipped, 1);
        assert!(segments[1].synthesized_audio_ref.is_none());
    }

    #[tokio::test]
    async fn test_synthesize_partial_failure_continues() {
        let (_dir, arena) = arena().await;
        let mut segments = vec![segment_with_text(0, "a"), segment_with_text(1, "b")];

        let mut synth = MockSynth::new();
        let mut call = 0usize;
        synth.expect_synthesize().times(2).returning(move |_, _, _| {
            call += 1;
            if call == 1 {
                Err(ServiceError::request_failed("tts hiccup"))
            } else {
                Ok(b"mp3".to_vec())
            }
        });

        let report = synthesize_segments(
            &arena,
            &mut segments,
            &HashMap::new(),
            VoicePreference::Female,
            &TargetLocale::default(),
            &synth,
        )
        .await
        .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.synthesized, 1);
        assert!(segments[0].synthesized_audio_ref.is_none());
        assert!(segments[1].synthesized_audio_ref.is_some());
    }

    #[tokio::test]
    async fn test_synthesize_all_failed_is_no_audio() {
        let (_dir, arena) = arena().await;
        let mut segments = vec![segment_with_text(0, "a")];

        let mut synth = MockSynth::new();
        synth
            .expect_synthesize()
            .returning(|_, _, _| Err(ServiceError::request_failed("tts down")));

        let err = synthesize_segments(
            &arena,
            &mut segments,
            &HashMap::new(),
            VoicePreference::Female,
            &TargetLocale::default(),
            &synth,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::NoAudioGenerated));
    }

    #[tokio::test]
    async fn test_synthesize_all_skipped_is_no_audio() {
        let (_dir, arena) = arena().await;
        let mut segments = vec![segment_with_text(0, ""), segment_with_text(1, "")];

        let synth = MockSynth::new(); // never called

        let err = synthesize_segments(
            &arena,
            &mut segments,
            &HashMap::new(),
            VoicePreference::Female,
            &TargetLocale::default(),
            &synth,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::NoAudioGenerated));
    }
}
