//! File delivery handlers: segment audio for review, final videos.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_DISPOSITION;
use axum::http::{HeaderValue, Request};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

use vodub_models::JobId;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

async fn serve_file(path: &std::path::Path) -> ApiResult<Response> {
    let request = Request::builder()
        .body(Body::empty())
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(response.into_response())
}

/// GET /api/jobs/{job_id}/segments/{index}/audio
///
/// The original speech chunk for one segment, for playback in the review UI.
pub async fn segment_audio(
    State(state): State<AppState>,
    Path((job_id, index)): Path<(String, usize)>,
) -> ApiResult<Response> {
    let id = JobId::parse(&job_id).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let path = state.controller.segment_audio(&id, index).await?;
    debug!(job_id = %id, index, "Serving segment audio");
    serve_file(&path).await
}

/// GET /api/videos/{filename}
///
/// The completed deliverable. Only sanitized `*_translated.mp4` names resolve
/// into the output directory; anything else is a 404.
pub async fn final_video(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let path = state
        .controller
        .store()
        .final_video_path(&filename)
        .ok_or_else(|| ApiError::not_found(format!("no such video: {filename}")))?;
    if !path.is_file() {
        return Err(ApiError::not_found(format!("no such video: {filename}")));
    }

    let mut response = serve_file(&path).await?;
    // The filename passed validation above, so the header value is clean.
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\"")) {
        response.headers_mut().insert(CONTENT_DISPOSITION, value);
    }
    Ok(response)
}
