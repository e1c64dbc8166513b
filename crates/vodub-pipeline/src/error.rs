//! Pipeline error taxonomy.
//!
//! Segment-level failures (transcription, translation, synthesis of one
//! segment) never appear here: they are absorbed into the segment's
//! diagnostic status fields. These errors are the phase-level ones that
//! abort a job or reject a request.

use thiserror::Error;

use vodub_models::JobPhase;
use vodub_store::StoreError;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Phase-level pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad upload or URL, rejected before any job exists.
    #[error("Invalid input: {0}")]
    InputError(String),

    /// Remote video fetch failed; no job was created.
    #[error("Video acquisition failed: {0}")]
    AcquisitionFailed(String),

    /// No audio track or decode error.
    #[error("Audio extraction failed: {0}")]
    ExtractionFailed(String),

    /// The track contains no speech at all.
    #[error("No speech detected in the audio track")]
    NoSpeechDetected,

    /// Every segment failed or was skipped at synthesis.
    #[error("No audio generated: all segments failed or were skipped")]
    NoAudioGenerated,

    /// Timeline export failed.
    #[error("Audio reconstruction failed: {0}")]
    ReconstructionFailed(String),

    /// The final remux failed.
    #[error("Merge failed: {0}")]
    MergeFailed(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Finalize called on a job that is not at (or retryable from) the
    /// review checkpoint.
    #[error("Job {job_id} is not ready for finalize (status: {status})")]
    JobNotReady { job_id: String, status: String },

    #[error("Segment {index} not found")]
    SegmentNotFound { index: usize },

    #[error(transparent)]
    Store(StoreError),
}

impl PipelineError {
    /// The phase a failure should be recorded against in the job record,
    /// when there is one.
    pub fn phase(&self) -> Option<JobPhase> {
        match self {
            PipelineError::AcquisitionFailed(_) => Some(JobPhase::Acquisition),
            PipelineError::ExtractionFailed(_) => Some(JobPhase::Extraction),
            PipelineError::NoSpeechDetected => Some(JobPhase::Segmentation),
            PipelineError::NoAudioGenerated => Some(JobPhase::Synthesis),
            PipelineError::ReconstructionFailed(_) => Some(JobPhase::Reconstruction),
            PipelineError::MergeFailed(_) => Some(JobPhase::Mux),
            _ => None,
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => PipelineError::JobNotFound(id),
            other => PipelineError::Store(other),
        }
    }
}
