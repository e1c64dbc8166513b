//! Job manifest persistence.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use vodub_models::{sanitize_name, Job, JobId};

use crate::arena::JobArena;
use crate::error::{StoreError, StoreResult};

/// Suffix every completed deliverable carries. Serving refuses anything else.
const FINAL_VIDEO_SUFFIX: &str = "_translated.mp4";

/// Store for job records and their working areas, plus the directory the
/// final deliverables land in.
#[derive(Debug, Clone)]
pub struct JobStore {
    jobs_root: PathBuf,
    output_root: PathBuf,
}

impl JobStore {
    pub fn new(jobs_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            jobs_root: jobs_root.into(),
            output_root: output_root.into(),
        }
    }

    /// Create both roots if missing. Called once at startup.
    pub async fn ensure_roots(&self) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.jobs_root).await?;
        tokio::fs::create_dir_all(&self.output_root).await?;
        Ok(())
    }

    /// Working-area handle for a job. Purely path math, no filesystem access.
    pub fn arena(&self, job_id: &JobId) -> JobArena {
        JobArena::new(&self.jobs_root, job_id.clone())
    }

    /// Create the working area for a new job and persist its manifest.
    pub async fn create(&self, job: &Job) -> StoreResult<JobArena> {
        let arena = self.arena(&job.job_id);
        arena.ensure().await?;
        self.save(job).await?;
        info!(job_id = %job.job_id, "Created job");
        Ok(arena)
    }

    /// Load a job record. `NotFound` when the job directory or manifest is
    /// gone.
    pub async fn load(&self, job_id: &JobId) -> StoreResult<Job> {
        let path = self.arena(job_id).manifest_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(job_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Persist a job record. Idempotent overwrite, last writer wins.
    pub async fn save(&self, job: &Job) -> StoreResult<()> {
        let arena = self.arena(&job.job_id);
        arena.ensure().await?;
        let json = serde_json::to_vec_pretty(job)?;

        // Write-then-rename so a crash mid-save never truncates the manifest.
        let tmp = arena.manifest_path().with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, arena.manifest_path()).await?;

        debug!(job_id = %job.job_id, status = %job.status, "Saved manifest");
        Ok(())
    }

    /// Delete a job and its entire working area.
    pub async fn delete(&self, job_id: &JobId) -> StoreResult<()> {
        let arena = self.arena(job_id);
        if !arena.exists() {
            return Err(StoreError::NotFound(job_id.to_string()));
        }
        arena.remove().await;
        info!(job_id = %job_id, "Deleted job");
        Ok(())
    }

    /// Where a completed deliverable lives.
    pub fn final_video_path(&self, filename: &str) -> Option<PathBuf> {
        if !is_final_video_filename(filename) {
            return None;
        }
        Some(self.output_root.join(filename))
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }
}

/// Validate a deliverable filename: must already be in sanitized form and
/// carry the completed-job suffix, so the endpoint can never serve an
/// arbitrary file.
pub fn is_final_video_filename(filename: &str) -> bool {
    filename.ends_with(FINAL_VIDEO_SUFFIX)
        && filename.len() > FINAL_VIDEO_SUFFIX.len()
        && sanitize_name(filename) == filename
}

#[cfg(test)]
mod tests {
    use super::*;
    use vodub_models::{JobMode, JobStatus, Segment, TargetLocale, VoicePreference};

    fn store() -> (tempfile::TempDir, JobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::new(dir.path().join("jobs"), dir.path().join("out"));
        (dir, store)
    }

    fn job() -> Job {
        let mut job = Job::new(
            "demo",
            JobMode::Review,
            VoicePreference::Female,
            TargetLocale::default(),
        );
        job.segments.push(Segment::detected(0, 1000, 4000, 1000));
        job
    }

    #[tokio::test]
    async fn test_create_load_round_trip() {
        let (_dir, store) = store();
        store.ensure_roots().await.unwrap();

        let job = job();
        store.create(&job).await.unwrap();

        let loaded = store.load(&job.job_id).await.unwrap();
        assert_eq!(loaded.job_id, job.job_id);
        assert_eq!(loaded.segments.len(), 1);
        assert_eq!(loaded.status, JobStatus::Created);
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let (_dir, store) = store();
        store.ensure_roots().await.unwrap();

        let mut job = job();
        store.create(&job).await.unwrap();

        job.transition(JobStatus::AwaitingReview);
        store.save(&job).await.unwrap();

        let loaded = store.load(&job.job_id).await.unwrap();
        assert_eq!(loaded.status, JobStatus::AwaitingReview);
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let (_dir, store) = store();
        store.ensure_roots().await.unwrap();

        let id = JobId::parse("1_missing").unwrap();
        assert!(matches!(
            store.load(&id).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_working_area() {
        let (_dir, store) = store();
        store.ensure_roots().await.unwrap();

        let job = job();
        let arena = store.create(&job).await.unwrap();
        tokio::fs::write(arena.chunk_wav(0), b"wav").await.unwrap();

        store.delete(&job.job_id).await.unwrap();
        assert!(!arena.exists());
        assert!(matches!(
            store.load(&job.job_id).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[test]
    fn test_final_video_filename_rules() {
        assert!(is_final_video_filename("demo_translated.mp4"));
        assert!(!is_final_video_filename("_translated.mp4")); // no base name
        assert!(!is_final_video_filename("demo.mp4"));
        assert!(!is_final_video_filename("../demo_translated.mp4"));
        assert!(!is_final_video_filename("a/b_translated.mp4"));
    }

    #[test]
    fn test_final_video_path_refuses_bad_names() {
        let (_dir, store) = store();
        assert!(store.final_video_path("../../etc/passwd").is_none());
        assert!(store
            .final_video_path("demo_translated.mp4")
            .unwrap()
            .ends_with("demo_translated.mp4"));
    }
}
