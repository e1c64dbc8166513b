//! Pipeline configuration.
//!
//! One immutable configuration object, built at startup and passed into the
//! controller. No ambient globals.

use std::path::PathBuf;

use vodub_media::SilenceConfig;
use vodub_models::TargetLocale;

/// Configuration for the dubbing pipeline.
#[derive(Debug, Clone)]
pub struct DubbingConfig {
    /// Root directory for per-job working areas.
    pub jobs_root: PathBuf,
    /// Directory completed videos land in.
    pub output_root: PathBuf,
    /// Silence segmentation parameters.
    pub silence: SilenceConfig,
    /// Language/region pair jobs dub into.
    pub target_locale: TargetLocale,
    /// Language hint sent to the transcription service.
    pub source_language: String,
}

impl Default for DubbingConfig {
    fn default() -> Self {
        Self {
            jobs_root: PathBuf::from("/tmp/vodub/jobs"),
            output_root: PathBuf::from("/tmp/vodub/output"),
            silence: SilenceConfig::default(),
            target_locale: TargetLocale::default(),
            source_language: "en-US".to_string(),
        }
    }
}

impl DubbingConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            jobs_root: std::env::var("VODUB_JOBS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.jobs_root),
            output_root: std::env::var("VODUB_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_root),
            silence: SilenceConfig {
                min_silence_ms: std::env::var("VODUB_MIN_SILENCE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.silence.min_silence_ms),
                silence_threshold_dbfs: std::env::var("VODUB_SILENCE_THRESHOLD_DBFS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.silence.silence_threshold_dbfs),
            },
            target_locale: match (
                std::env::var("VODUB_TARGET_LANGUAGE").ok(),
                std::env::var("VODUB_TARGET_LOCALE").ok(),
            ) {
                (Some(lang), Some(tag)) => TargetLocale::new(lang, tag),
                _ => defaults.target_locale,
            },
            source_language: std::env::var("VODUB_SOURCE_LANGUAGE")
                .unwrap_or(defaults.source_language),
        }
    }
}
