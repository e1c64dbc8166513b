//! Job orchestration.
//!
//! [`DubbingController`] owns the store and the external service adapters and
//! drives jobs through the state machine. The analysis phase runs in
//! [`DubbingController::start`]; the finalize phase runs either immediately
//! (direct mode) or later from [`DubbingController::finalize`].
//!
//! Failure policy: anything that fails before the review checkpoint discards
//! the working area, since nothing in it is worth retrying. Failures at or
//! after the checkpoint persist a `Failed` manifest so finalize can be
//! retried with the same (or corrected) edits.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use vodub_media::{extract_audio, replace_audio, segment_audio_file};
use vodub_models::{Job, JobId, JobMode, JobStatus, VoicePreference};
use vodub_services::{SpeechSynthesizer, TranscriptionService, TranslationService};
use vodub_store::JobStore;

use crate::config::DubbingConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::segments::{analyze_segments, reconstruct_timeline, synthesize_segments};
use crate::source::VideoSource;

/// The three external service adapters the pipeline calls out to.
#[derive(Clone)]
pub struct Services {
    pub transcriber: Arc<dyn TranscriptionService>,
    pub translator: Arc<dyn TranslationService>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

/// What [`DubbingController::start`] produced.
#[derive(Debug)]
pub enum StartOutcome {
    /// Review mode: the job is suspended at the checkpoint with its
    /// transcripts and translations ready for editing.
    AwaitingReview { job: Job },
    /// Direct mode: the job ran straight through; the deliverable exists.
    Completed { job: Job },
}

/// Orchestrates dubbing jobs end to end.
pub struct DubbingController {
    store: JobStore,
    services: Services,
    config: DubbingConfig,
}

impl DubbingController {
    pub fn new(config: DubbingConfig, services: Services) -> Self {
        let store = JobStore::new(&config.jobs_root, &config.output_root);
        Self {
            store,
            services,
            config,
        }
    }

    /// Create the storage roots. Called once at startup.
    pub async fn init(&self) -> PipelineResult<()> {
        self.store.ensure_roots().await?;
        Ok(())
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Run the analysis phase for a new job, and in direct mode the finalize
    /// phase as well.
    pub async fn start(
        &self,
        source: VideoSource,
        mode: JobMode,
        voice: VoicePreference,
    ) -> PipelineResult<StartOutcome> {
        let (base, extension) = match source.validate() {
            Ok(parts) => parts,
            Err(e) => {
                source.discard().await;
                return Err(e);
            }
        };

        let mut job = Job::new(&base, mode, voice, self.config.target_locale.clone());
        let arena = self.store.create(&job).await?;
        info!(job_id = %job.job_id, ?mode, "Starting dubbing job");

        // Acquisition. Failure here leaves nothing worth keeping.
        job.source_video_ref = match source.acquire(&arena, &extension).await {
            Ok(file_ref) => file_ref,
            Err(e) => {
                arena.remove().await;
                return Err(e);
            }
        };
        job.transition(JobStatus::Segmenting);
        self.store.save(&job).await?;

        if let Err(e) = self.analyze(&mut job).await {
            warn!(job_id = %job.job_id, error = %e, "Analysis phase failed, discarding job");
            arena.remove().await;
            return Err(e);
        }

        match job.mode {
            JobMode::Review => {
                job.transition(JobStatus::AwaitingReview);
                self.store.save(&job).await?;
                info!(
                    job_id = %job.job_id,
                    segments = job.segments.len(),
                    "Job awaiting review"
                );
                Ok(StartOutcome::AwaitingReview { job })
            }
            JobMode::Direct => {
                // Direct mode is review mode with the translations
                // auto-approved unedited. There is no checkpoint to retry
                // from, so any failure discards the working area.
                if let Err(e) = self.run_finalize(&mut job, &HashMap::new()).await {
                    arena.remove().await;
                    return Err(e);
                }
                Ok(StartOutcome::Completed { job })
            }
        }
    }

    /// Extract, segment, transcribe, translate.
    async fn analyze(&self, job: &mut Job) -> PipelineResult<()> {
        let arena = self.store.arena(&job.job_id);
        let video = arena.resolve(&job.source_video_ref);
        let master = arena.master_audio();

        extract_audio(&video, &master)
            .await
            .map_err(|e| PipelineError::ExtractionFailed(e.to_string()))?;

        let ranges = segment_audio_file(&master, &self.config.silence)
            .await
            .map_err(|e| PipelineError::ExtractionFailed(e.to_string()))?;
        if ranges.is_empty() {
            return Err(PipelineError::NoSpeechDetected);
        }
        info!(job_id = %job.job_id, ranges = ranges.len(), "Speech ranges detected");

        job.segments = analyze_segments(
            &arena,
            &ranges,
            self.services.transcriber.as_ref(),
            self.services.translator.as_ref(),
            &self.config,
        )
        .await;
        self.store.save(job).await?;
        Ok(())
    }

    /// Resume a job from the review checkpoint with the reviewer's edits.
    /// Also the retry path for jobs that failed after reaching it.
    ///
    /// The voice preference chosen at job creation stays in force; a
    /// different one supplied here is ignored.
    pub async fn finalize(
        &self,
        job_id: &JobId,
        edits: HashMap<usize, String>,
        voice: Option<VoicePreference>,
    ) -> PipelineResult<Job> {
        let mut job = self.store.load(job_id).await?;
        if !job.status.is_finalizable() {
            return Err(PipelineError::JobNotReady {
                job_id: job_id.to_string(),
                status: job.status.to_string(),
            });
        }
        if let Some(requested) = voice {
            if requested != job.voice_preference {
                warn!(
                    job_id = %job_id,
                    requested = requested.as_str(),
                    "Voice preference is fixed at job creation, ignoring"
                );
            }
        }

        self.run_finalize(&mut job, &edits).await?;
        Ok(job)
    }

    /// Synthesize, reconstruct, mux. Persists `Failed` and keeps the working
    /// area on error so the whole pass can be retried.
    async fn run_finalize(
        &self,
        job: &mut Job,
        edits: &HashMap<usize, String>,
    ) -> PipelineResult<()> {
        match self.finalize_phases(job, edits).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if let Some(phase) = e.phase() {
                    job.fail(phase, e.to_string());
                    self.store.save(job).await?;
                }
                Err(e)
            }
        }
    }

    async fn finalize_phases(
        &self,
        job: &mut Job,
        edits: &HashMap<usize, String>,
    ) -> PipelineResult<()> {
        let arena = self.store.arena(&job.job_id);

        // Persisting `Synthesizing` first rejects a concurrent finalize of
        // the same job.
        job.transition(JobStatus::Synthesizing);
        self.store.save(job).await?;

        let report = synthesize_segments(
            &arena,
            &mut job.segments,
            edits,
            job.voice_preference,
            &job.target_locale,
            self.services.synthesizer.as_ref(),
        )
        .await?;
        info!(job_id = %job.job_id, synthesized = report.synthesized, "Segments synthesized");

        job.transition(JobStatus::Reconstructing);
        self.store.save(job).await?;
        let combined = reconstruct_timeline(&arena, &job.segments).await?;

        job.transition(JobStatus::Muxing);
        self.store.save(job).await?;
        let output = self
            .store
            .final_video_path(&job.final_video_filename())
            .ok_or_else(|| {
                PipelineError::MergeFailed(format!(
                    "invalid deliverable name: {}",
                    job.final_video_filename()
                ))
            })?;
        let video = arena.resolve(&job.source_video_ref);
        replace_audio(&video, &combined, &output)
            .await
            .map_err(|e| PipelineError::MergeFailed(e.to_string()))?;

        job.transition(JobStatus::Completed);
        info!(job_id = %job.job_id, output = %output.display(), "Job completed");

        // The deliverable is out; the working area has served its purpose.
        arena.remove().await;
        Ok(())
    }

    /// Load a job record for status queries.
    pub async fn job(&self, job_id: &JobId) -> PipelineResult<Job> {
        Ok(self.store.load(job_id).await?)
    }

    /// Path of a segment's original audio chunk, for the review UI.
    pub async fn segment_audio(&self, job_id: &JobId, index: usize) -> PipelineResult<PathBuf> {
        let job = self.store.load(job_id).await?;
        let segment = job
            .segment(index)
            .ok_or(PipelineError::SegmentNotFound { index })?;
        if !segment.has_chunk() {
            return Err(PipelineError::SegmentNotFound { index });
        }
        let path = self.store.arena(job_id).chunk_wav(segment.index);
        if !path.is_file() {
            return Err(PipelineError::SegmentNotFound { index });
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use std::path::Path;
    use vodub_models::{JobPhase, Segment, TargetLocale};
    use vodub_services::ServiceResult;

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

    fn idle_services() -> Services {
        Services {
            transcriber: Arc::new(MockStt::new()),
            translator: Arc::new(MockMt::new()),
            synthesizer: Arc::new(MockSynth::new()),
        }
    }

    async fn controller() -> (tempfile::TempDir, DubbingController) {
        let dir = tempfile::tempdir().unwrap();
        let config = DubbingConfig {
            jobs_root: dir.path().join("jobs"),
            output_root: dir.path().join("out"),
            ..DubbingConfig::default()
        };
        let controller = DubbingController::new(config, idle_services());
        controller.init().await.unwrap();
        (dir, controller)
    }

    async fn persist_job(controller: &DubbingController, status: JobStatus) -> Job {
        let mut job = Job::new(
            "demo",
            JobMode::Review,
            VoicePreference::Female,
            TargetLocale::default(),
        );
        job.segments.push(Segment::detected(0, 1000, 4000, 1000));
        job.transition(status);
        controller.store().create(&job).await.unwrap();
        job
    }

    #[tokio::test]
    async fn test_start_rejects_bad_input_without_creating_a_job() {
        let (dir, controller) = controller().await;
        let source = VideoSource::Upload {
            path: dir.path().join("nothing"),
            original_filename: "notes.txt".into(),
        };
        let err = controller
            .start(source, JobMode::Direct, VoicePreference::Female)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InputError(_)));

        let mut entries = tokio::fs::read_dir(dir.path().join("jobs")).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_finalize_missing_job() {
        let (_dir, controller) = controller().await;
        let id = JobId::parse("1_gone").unwrap();
        let err = controller
            .finalize(&id, HashMap::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::JobNotFound(_)));
    }

    #[tokio::test]
    async fn test_finalize_rejects_non_finalizable_statuses() {
        let (_dir, controller) = controller().await;

        for status in [
            JobStatus::Created,
            JobStatus::Segmenting,
            JobStatus::Synthesizing,
            JobStatus::Completed,
            JobStatus::Failed {
                phase: JobPhase::Segmentation,
                reason: "no speech".into(),
            },
        ] {
            let job = persist_job(&controller, status).await;
            let err = controller
                .finalize(&job.job_id, HashMap::new(), None)
                .await
                .unwrap_err();
            assert!(
                matches!(err, PipelineError::JobNotReady { .. }),
                "status should not be finalizable"
            );
            controller.store().delete(&job.job_id).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_finalize_retry_allowed_after_post_review_failure() {
        // A synthesis-phase failure leaves the job retryable; with the TTS
        // service still down the retry fails the same way but the manifest
        // survives for the next attempt.
        let dir = tempfile::tempdir().unwrap();
        let config = DubbingConfig {
            jobs_root: dir.path().join("jobs"),
            output_root: dir.path().join("out"),
            ..DubbingConfig::default()
        };
        let mut synth = MockSynth::new();
        synth.expect_synthesize().returning(|_, _, _| {
            Err(vodub_services::ServiceError::request_failed("tts down"))
        });
        let services = Services {
            transcriber: Arc::new(MockStt::new()),
            translator: Arc::new(MockMt::new()),
            synthesizer: Arc::new(synth),
        };
        let controller = DubbingController::new(config, services);
        controller.init().await.unwrap();

        let job = {
            let mut job = Job::new(
                "demo",
                JobMode::Review,
                VoicePreference::Female,
                TargetLocale::default(),
            );
            let mut seg = Segment::detected(0, 1000, 4000, 1000);
            seg.translated_text = "text".into();
            job.segments.push(seg);
            job.transition(JobStatus::Failed {
                phase: JobPhase::Synthesis,
                reason: "tts down".into(),
            });
            controller.store().create(&job).await.unwrap();
            job
        };

        let err = controller
            .finalize(&job.job_id, HashMap::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoAudioGenerated));

        let reloaded = controller.job(&job.job_id).await.unwrap();
        assert!(matches!(
            reloaded.status,
            JobStatus::Failed {
                phase: JobPhase::Synthesis,
                ..
            }
        ));
        assert!(reloaded.status.is_finalizable());
    }

    #[tokio::test]
    async fn test_segment_audio_lookup() {
        let (_dir, controller) = controller().await;
        let job = persist_job(&controller, JobStatus::AwaitingReview).await;

        // Segment exists in the manifest but its chunk was never exported.
        let err = controller.segment_audio(&job.job_id, 0).await.unwrap_err();
        assert!(matches!(err, PipelineError::SegmentNotFound { index: 0 }));

        let err = controller.segment_audio(&job.job_id, 9).await.unwrap_err();
        assert!(matches!(err, PipelineError::SegmentNotFound { index: 9 }));
    }

    #[tokio::test]
    async fn test_segment_audio_serves_exported_chunk() {
        let (_dir, controller) = controller().await;
        let mut job = Job::new(
            "demo",
            JobMode::Review,
            VoicePreference::Female,
            TargetLocale::default(),
        );
        let mut seg = Segment::detected(0, 1000, 4000, 1000);
        seg.original_audio_chunk_ref = vodub_store::chunk_wav_name(0);
        job.segments.push(seg);
        job.transition(JobStatus::AwaitingReview);
        let arena = controller.store().create(&job).await.unwrap();
        tokio::fs::write(arena.chunk_wav(0), b"wav").await.unwrap();

        let path = controller.segment_audio(&job.job_id, 0).await.unwrap();
        assert!(path.ends_with("chunks/chunk_0.wav"));
    }
}
