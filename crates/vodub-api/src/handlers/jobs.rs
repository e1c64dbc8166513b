//! Job lifecycle handlers: start, review status, finalize, delete.

use std::collections::HashMap;
use std::path::PathBuf;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use vodub_models::{Job, JobId, JobMode, JobPhase, JobStatus, VoicePreference};
use vodub_pipeline::{PipelineError, StartOutcome, VideoSource};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// One segment as shown to the reviewer.
#[derive(Debug, Serialize)]
pub struct SegmentView {
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub silence_before_ms: u64,
    pub transcribed_text: String,
    pub translated_text: String,
    pub transcription_status: String,
    pub translation_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    pub synthesized: bool,
}

#[derive(Debug, Serialize)]
pub struct FailureView {
    pub phase: JobPhase,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct FinalVideoView {
    pub filename: String,
    pub download_url: String,
}

/// Job state as returned by every job endpoint.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job_id: String,
    pub status: String,
    pub mode: JobMode,
    pub voice_preference: VoicePreference,
    pub segments: Vec<SegmentView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_video: Option<FinalVideoView>,
}

impl JobResponse {
    fn from_job(job: &Job) -> Self {
        let segments = job
            .segments
            .iter()
            .map(|s| SegmentView {
                index: s.index,
                start_ms: s.start_ms,
                end_ms: s.end_ms,
                silence_before_ms: s.silence_before_ms,
                transcribed_text: s.transcribed_text.clone(),
                translated_text: s.translated_text.clone(),
                transcription_status: s.transcription_status.clone(),
                translation_status: s.translation_status.clone(),
                audio_url: s.has_chunk().then(|| {
                    format!("/api/jobs/{}/segments/{}/audio", job.job_id, s.index)
                }),
                synthesized: s.synthesized_audio_ref.is_some(),
            })
            .collect();

        let failure = match &job.status {
            JobStatus::Failed { phase, reason } => Some(FailureView {
                phase: *phase,
                reason: reason.clone(),
            }),
            _ => None,
        };

        let final_video = (job.status == JobStatus::Completed).then(|| {
            let filename = job.final_video_filename();
            FinalVideoView {
                download_url: format!("/api/videos/{filename}"),
                filename,
            }
        });

        Self {
            job_id: job.job_id.to_string(),
            status: job.status.as_str().to_string(),
            mode: job.mode,
            voice_preference: job.voice_preference,
            segments,
            failure,
            final_video,
        }
    }
}

fn parse_voice(s: &str) -> ApiResult<VoicePreference> {
    match s.to_ascii_lowercase().as_str() {
        "female" => Ok(VoicePreference::Female),
        "male" => Ok(VoicePreference::Male),
        other => Err(ApiError::bad_request(format!("unknown voice: {other}"))),
    }
}

fn parse_mode(s: &str) -> ApiResult<JobMode> {
    match s.to_ascii_lowercase().as_str() {
        "direct" => Ok(JobMode::Direct),
        "review" => Ok(JobMode::Review),
        other => Err(ApiError::bad_request(format!("unknown mode: {other}"))),
    }
}

fn parse_job_id(s: &str) -> ApiResult<JobId> {
    JobId::parse(s).map_err(|e| ApiError::bad_request(e.to_string()))
}

/// POST /api/jobs (multipart)
///
/// Fields: `file` (the video) or `youtube_url`, plus optional `tts_voice`
/// (`female`/`male`) and `mode` (`direct`/`review`). A file takes precedence
/// over a URL if both are sent.
pub async fn start_job(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<JobResponse>> {
    let mut upload: Option<(PathBuf, String)> = None;
    let mut youtube_url: Option<String> = None;
    let mut voice = VoicePreference::default();
    let mut mode = JobMode::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                if filename.is_empty() {
                    return Err(ApiError::bad_request("upload has no filename"));
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("upload read failed: {e}")))?;
                if data.is_empty() {
                    return Err(ApiError::bad_request("uploaded file is empty"));
                }
                upload = Some((spool_upload(&data).await?, filename));
            }
            "youtube_url" => {
                youtube_url = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(e.to_string()))?,
                );
            }
            "tts_voice" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                voice = parse_voice(&text)?;
            }
            "mode" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                mode = parse_mode(&text)?;
            }
            other => debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    let source = match (upload, youtube_url) {
        (Some((path, original_filename)), _) => VideoSource::Upload {
            path,
            original_filename,
        },
        (None, Some(url)) if !url.trim().is_empty() => VideoSource::RemoteUrl(url.trim().to_string()),
        _ => return Err(ApiError::bad_request("provide a file or a youtube_url")),
    };

    let outcome = state.controller.start(source, mode, voice).await?;
    let job = match &outcome {
        StartOutcome::AwaitingReview { job } | StartOutcome::Completed { job } => job,
    };
    info!(job_id = %job.job_id, status = %job.status, "Job request handled");
    Ok(Json(JobResponse::from_job(job)))
}

/// Write upload bytes to a spool file the pipeline will consume.
async fn spool_upload(data: &[u8]) -> ApiResult<PathBuf> {
    let spool = tempfile::Builder::new()
        .prefix("vodub-upload-")
        .tempfile()
        .map_err(|e| ApiError::internal(format!("spool file: {e}")))?;
    let (_file, path) = spool
        .keep()
        .map_err(|e| ApiError::internal(format!("spool file: {e}")))?;
    tokio::fs::write(&path, data)
        .await
        .map_err(|e| ApiError::internal(format!("spool write: {e}")))?;
    Ok(path)
}

/// GET /api/jobs/{job_id}
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobResponse>> {
    let id = parse_job_id(&job_id)?;
    let job = state.controller.job(&id).await?;
    Ok(Json(JobResponse::from_job(&job)))
}

#[derive(Debug, Deserialize)]
pub struct FinalizeRequest {
    /// Reviewer edits keyed by segment index. An empty string silences the
    /// segment.
    #[serde(default)]
    pub edited_translated_texts: HashMap<usize, String>,
    /// Accepted for compatibility; the preference chosen at creation wins.
    #[serde(default)]
    pub tts_voice: Option<String>,
}

/// POST /api/jobs/{job_id}/finalize
pub async fn finalize_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(request): Json<FinalizeRequest>,
) -> ApiResult<Json<JobResponse>> {
    let id = parse_job_id(&job_id)?;
    let voice = request.tts_voice.as_deref().map(parse_voice).transpose()?;

    let job = state
        .controller
        .finalize(&id, request.edited_translated_texts, voice)
        .await?;
    Ok(Json(JobResponse::from_job(&job)))
}

/// DELETE /api/jobs/{job_id}
pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_job_id(&job_id)?;
    state
        .controller
        .store()
        .delete(&id)
        .await
        .map_err(PipelineError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
