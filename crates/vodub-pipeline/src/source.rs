//! Source video acquisition.

use std::path::{Path, PathBuf};
use tracing::debug;

use vodub_media::download_video;
use vodub_store::JobArena;

use crate::error::{PipelineError, PipelineResult};

/// Video containers accepted for upload.
const ALLOWED_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "flv", "mpeg", "mpg"];

/// Where a job's video comes from.
#[derive(Debug, Clone)]
pub enum VideoSource {
    /// A file already written to local disk by the upload handler. The
    /// pipeline takes ownership of it.
    Upload {
        path: PathBuf,
        original_filename: String,
    },
    /// A remote URL fetched with yt-dlp.
    RemoteUrl(String),
}

impl VideoSource {
    /// Validate the source and derive the job's base name and the container
    /// extension to store the original under. Rejection here means no job is
    /// ever created.
    pub fn validate(&self) -> PipelineResult<(String, String)> {
        match self {
            VideoSource::Upload {
                original_filename, ..
            } => {
                let (base, ext) = split_filename(original_filename);
                let ext_lower = ext.to_ascii_lowercase();
                if base.is_empty() || !ALLOWED_EXTENSIONS.contains(&ext_lower.as_str()) {
                    return Err(PipelineError::InputError(format!(
                        "file type not allowed: {original_filename}"
                    )));
                }
                Ok((base.to_string(), ext_lower))
            }
            VideoSource::RemoteUrl(url) => {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(PipelineError::InputError(format!("invalid URL: {url}")));
                }
                // Downloads are merged to mp4.
                Ok(("youtube_video".to_string(), "mp4".to_string()))
            }
        }
    }

    /// Drop a rejected upload's spool file. URLs have nothing to clean up.
    pub async fn discard(self) {
        if let VideoSource::Upload { path, .. } = self {
            let _ = tokio::fs::remove_file(path).await;
        }
    }

    /// Bring the video into the job's working area, consuming the source.
    /// Returns the stored file name (the job's `source_video_ref`).
    pub async fn acquire(self, arena: &JobArena, extension: &str) -> PipelineResult<String> {
        let target = arena.original_video(extension);
        match self {
            VideoSource::Upload { path, .. } => {
                move_into(&path, &target).await.map_err(|e| {
                    PipelineError::AcquisitionFailed(format!(
                        "failed to move upload into working area: {e}"
                    ))
                })?;
            }
            VideoSource::RemoteUrl(url) => {
                download_video(&url, &target)
                    .await
                    .map_err(|e| PipelineError::AcquisitionFailed(e.to_string()))?;
            }
        }
        let file_ref = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        debug!(file_ref, "Source video acquired");
        Ok(file_ref)
    }
}

/// Rename, falling back to copy+remove across filesystems.
async fn move_into(from: &Path, to: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(_) => {
            tokio::fs::copy(from, to).await?;
            tokio::fs::remove_file(from).await
        }
    }
}

/// Split `name.ext` into (`name`, `ext`); missing extension yields an empty
/// extension.
fn split_filename(filename: &str) -> (&str, &str) {
    match filename.rsplit_once('.') {
        Some((base, ext)) => (base, ext),
        None => (filename, ""),
    }
}
