//! Job definitions for the two-phase dubbing pipeline.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::locale::TargetLocale;
use crate::segment::Segment;
use crate::sanitize_name;

/// Unique identifier for a dubbing job: unix creation time plus the sanitized
/// source name, e.g. `1724400000_holiday_clip`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(String);

/// Error for job id strings that arrive from outside (URL path segments).
#[derive(Debug, Error)]
#[error("invalid job id: {0}")]
pub struct JobIdError(String);

impl JobId {
    /// Derive an id for a new job from its sanitized base filename.
    pub fn derive(base_filename: &str, created_at: DateTime<Utc>) -> Self {
        Self(format!(
            "{}_{}",
            created_at.timestamp(),
            sanitize_name(base_filename)
        ))
    }

    /// Validate an externally supplied id. Rejects anything that could be a
    /// path traversal: only `[A-Za-z0-9_.-]` is allowed and `..` is refused.
    pub fn parse(s: &str) -> Result<Self, JobIdError> {
        let ok = !s.is_empty()
            && !s.contains("..")
            && !s.starts_with('.')
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
        if ok {
            Ok(Self(s.to_string()))
        } else {
            Err(JobIdError(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline execution mode, fixed at job creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobMode {
    /// Run start to finish, auto-approving translations.
    #[default]
    Direct,
    /// Suspend after translation and wait for an edit-and-finalize call.
    Review,
}

/// Requested gender of the synthesized voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VoicePreference {
    #[default]
    Female,
    Male,
}

impl VoicePreference {
    /// The fallback gender when no voice matches the requested one.
    pub fn opposite(self) -> Self {
        match self {
            VoicePreference::Female => VoicePreference::Male,
            VoicePreference::Male => VoicePreference::Female,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoicePreference::Female => "female",
            VoicePreference::Male => "male",
        }
    }
}

/// Pipeline phase, used to qualify failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Acquisition,
    Extraction,
    Segmentation,
    Analysis,
    Synthesis,
    Reconstruction,
    Mux,
}

impl JobPhase {
    /// Phases at or after the review checkpoint. A job failed in one of these
    /// keeps its working area so finalize can be retried.
    pub fn is_post_review(self) -> bool {
        matches!(
            self,
            JobPhase::Synthesis | JobPhase::Reconstruction | JobPhase::Mux
        )
    }
}

/// Job lifecycle status. Transitions are monotonic; the only permitted
/// regression is retrying the phase a job failed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Created,
    Segmenting,
    AwaitingReview,
    Synthesizing,
    Reconstructing,
    Muxing,
    Completed,
    Failed {
        phase: JobPhase,
        reason: String,
    },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed { .. })
    }

    /// Whether finalize may be (re)attempted from this status: either the job
    /// sits at the checkpoint, or it failed after reaching it.
    pub fn is_finalizable(&self) -> bool {
        match self {
            JobStatus::AwaitingReview => true,
            JobStatus::Failed { phase, .. } => phase.is_post_review(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Created => "created",
            JobStatus::Segmenting => "segmenting",
            JobStatus::AwaitingReview => "awaiting_review",
            JobStatus::Synthesizing => "synthesizing",
            JobStatus::Reconstructing => "reconstructing",
            JobStatus::Muxing => "muxing",
            JobStatus::Completed => "completed",
            JobStatus::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Failed { phase, reason } => {
                write!(f, "failed ({:?}: {})", phase, reason)
            }
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// One dubbing request. This struct, serialized as `manifest.json`, is the
/// durable contract between the analysis phase and the finalize phase.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    pub job_id: JobId,

    /// Sanitized name of the source, used for the final video filename.
    pub base_filename: String,

    /// File name of the original video inside the job's working area,
    /// e.g. `original_video.mp4`.
    pub source_video_ref: String,

    pub status: JobStatus,

    pub mode: JobMode,

    pub voice_preference: VoicePreference,

    pub target_locale: TargetLocale,

    /// Ordered by `index`; never reordered once segmentation completes.
    pub segments: Vec<Segment>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a job record before any processing has happened.
    pub fn new(
        base_filename: &str,
        mode: JobMode,
        voice_preference: VoicePreference,
        target_locale: TargetLocale,
    ) -> Self {
        let now = Utc::now();
        let base = sanitize_name(base_filename);
        Self {
            job_id: JobId::derive(&base, now),
            base_filename: base,
            source_video_ref: String::new(),
            status: JobStatus::Created,
            mode,
            voice_preference,
            target_locale,
            segments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to a new status, refreshing `updated_at`.
    pub fn transition(&mut self, status: JobStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Record a phase failure.
    pub fn fail(&mut self, phase: JobPhase, reason: impl Into<String>) {
        self.transition(JobStatus::Failed {
            phase,
            reason: reason.into(),
        });
    }

    /// File name of the final deliverable, e.g. `holiday_clip_translated.mp4`.
    pub fn final_video_filename(&self) -> String {
        format!("{}_translated.mp4", self.base_filename)
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.iter().find(|s| s.index == index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_derivation() {
        let ts = DateTime::parse_from_rfc3339("2026-08-25T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let id = JobId::derive("my clip!", ts);
        assert_eq!(id.as_str(), format!("{}_my_clip_", ts.timestamp()));
    }

    #[test]
    fn test_job_id_parse_rejects_traversal() {
        assert!(JobId::parse("1724400000_ok-name.v2").is_ok());
        assert!(JobId::parse("../etc").is_err());
        assert!(JobId::parse("a/b").is_err());
        assert!(JobId::parse("").is_err());
        assert!(JobId::parse(".hidden").is_err());
    }

    #[test]
    fn test_status_finalizable() {
        assert!(JobStatus::AwaitingReview.is_finalizable());
        assert!(JobStatus::Failed {
            phase: JobPhase::Synthesis,
            reason: "tts down".into()
        }
        .is_finalizable());
        assert!(!JobStatus::Failed {
            phase: JobPhase::Segmentation,
            reason: "no speech".into()
        }
        .is_finalizable());
        assert!(!JobStatus::Completed.is_finalizable());
        assert!(!JobStatus::Synthesizing.is_finalizable());
    }

    #[test]
    fn test_final_video_filename() {
        let job = Job::new(
            "demo clip",
            JobMode::Direct,
            VoicePreference::Female,
            TargetLocale::default(),
        );
        assert_eq!(job.final_video_filename(), "demo_clip_translated.mp4");
    }

    #[test]
    fn test_manifest_round_trip() {
        let mut job = Job::new(
            "demo",
            JobMode::Review,
            VoicePreference::Male,
            TargetLocale::default(),
        );
        job.segments.push(Segment::detected(0, 1000, 4000, 1000));
        job.transition(JobStatus::AwaitingReview);

        let json = serde_json::to_string(&job).unwrap();
        let back: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, JobStatus::AwaitingReview);
        assert_eq!(back.segments.len(), 1);
        assert_eq!(back.segments[0].silence_before_ms, 1000);
    }

    #[test]
    fn test_failed_status_round_trip() {
        let status = JobStatus::Failed {
            phase: JobPhase::Mux,
            reason: "encoder exited".into(),
        };
        let json = serde_json::to_string(&status).unwrap();
        let back: JobStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
        assert_eq!(back.as_str(), "failed");
    }
}
