//! Health and readiness handlers.

use axum::Json;
use serde::Serialize;

use vodub_media::{check_ffmpeg, check_ffprobe, check_ytdlp};

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
pub struct ReadyResponse {
    ready: bool,
    ffmpeg: bool,
    ffprobe: bool,
    yt_dlp: bool,
}

/// GET /ready
///
/// Reports whether the external tools the pipeline shells out to are on
/// PATH. yt-dlp is only needed for URL jobs, so it does not gate readiness.
pub async fn ready() -> Json<ReadyResponse> {
    let ffmpeg = check_ffmpeg().is_ok();
    let ffprobe = check_ffprobe().is_ok();
    let yt_dlp = check_ytdlp().is_ok();
    Json(ReadyResponse {
        ready: ffmpeg && ffprobe,
        ffmpeg,
        ffprobe,
        yt_dlp,
    })
}
