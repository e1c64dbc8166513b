//! Job-scoped working area.

use std::path::{Path, PathBuf};
use tracing::warn;

use vodub_models::{sanitize_name, JobId};

use crate::error::StoreResult;

const MASTER_AUDIO: &str = "original_audio.wav";
const COMBINED_AUDIO: &str = "combined_audio.mp3";
const MANIFEST: &str = "manifest.json";
const CHUNKS_DIR: &str = "chunks";

/// Opaque handle to one job's exclusive working directory.
///
/// All paths are derived from the job id here and nowhere else, so no other
/// component ever constructs a path into a job directory. The job id itself
/// is validated/sanitized before an arena exists (see [`JobId::parse`]).
#[derive(Debug, Clone)]
pub struct JobArena {
    job_id: JobId,
    dir: PathBuf,
}

impl JobArena {
    pub(crate) fn new(jobs_root: &Path, job_id: JobId) -> Self {
        let dir = jobs_root.join(job_id.as_str());
        Self { job_id, dir }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Create the directory tree (idempotent).
    pub async fn ensure(&self) -> StoreResult<()> {
        tokio::fs::create_dir_all(self.chunks_dir()).await?;
        Ok(())
    }

    /// Delete the whole working area. Missing directories are fine; anything
    /// else failing is logged and swallowed, cleanup must never mask the
    /// error that triggered it.
    pub async fn remove(&self) {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(job_id = %self.job_id, error = %e, "Failed to remove working area"),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST)
    }

    /// Path for the original video, preserving its container extension.
    pub fn original_video(&self, extension: &str) -> PathBuf {
        let ext = sanitize_name(extension);
        self.dir.join(format!("original_video.{ext}"))
    }

    /// Resolve a stored `source_video_ref` (a file name) into the arena.
    pub fn resolve(&self, file_ref: &str) -> PathBuf {
        self.dir.join(sanitize_name(file_ref))
    }

    pub fn master_audio(&self) -> PathBuf {
        self.dir.join(MASTER_AUDIO)
    }

    pub fn chunks_dir(&self) -> PathBuf {
        self.dir.join(CHUNKS_DIR)
    }

    /// Original speech chunk for one segment.
    pub fn chunk_wav(&self, index: usize) -> PathBuf {
        self.chunks_dir().join(chunk_wav_name(index))
    }

    /// Synthesized clip for one segment.
    pub fn tts_chunk(&self, index: usize) -> PathBuf {
        self.chunks_dir().join(tts_chunk_name(index))
    }

    pub fn combined_audio(&self) -> PathBuf {
        self.dir.join(COMBINED_AUDIO)
    }
}

/// File name of a segment's original chunk, e.g. `chunk_3.wav`.
pub fn chunk_wav_name(index: usize) -> String {
    format!("chunk_{index}.wav")
}

/// File name of a segment's synthesized clip, e.g. `chunk_3_tts.mp3`.
pub fn tts_chunk_name(index: usize) -> String {
    format!("chunk_{index}_tts.mp3")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> JobArena {
        let id = JobId::parse("1724400000_demo").unwrap();
        JobArena::new(Path::new("/data/jobs"), id)
    }

    #[test]
    fn test_path_layout() {
        let a = arena();
        assert_eq!(a.dir(), Path::new("/data/jobs/1724400000_demo"));
        assert_eq!(
            a.chunk_wav(3),
            Path::new("/data/jobs/1724400000_demo/chunks/chunk_3.wav")
        );
        assert_eq!(
            a.tts_chunk(3),
            Path::new("/data/jobs/1724400000_demo/chunks/chunk_3_tts.mp3")
        );
        assert!(a.manifest_path().ends_with("manifest.json"));
    }

    #[test]
    fn test_resolve_sanitizes_refs() {
        let a = arena();
        let resolved = a.resolve("../escape.mp4");
        assert!(resolved.starts_with(a.dir()));
        assert!(!resolved.to_string_lossy().contains(".."));
    }

    #[test]
    fn test_original_video_extension_sanitized() {
        let a = arena();
        let p = a.original_video("mp4");
        assert!(p.ends_with("original_video.mp4"));
        let weird = a.original_video("m p/4");
        assert!(weird.starts_with(a.dir()));
    }

    #[tokio::test]
    async fn test_ensure_and_remove() {
        let root = tempfile::tempdir().unwrap();
        let id = JobId::parse("1724400000_demo").unwrap();
        let a = JobArena::new(root.path(), id);

        a.ensure().await.unwrap();
        assert!(a.chunks_dir().is_dir());

        a.remove().await;
        assert!(!a.exists());

        // Removing twice is quiet.
        a.remove().await;
    }
}
