//! Service endpoint configuration.

use std::time::Duration;

/// Endpoints and timeouts for the external services.
#[derive(Debug, Clone)]
pub struct ServicesConfig {
    /// Base URL of the speech-to-text service.
    pub transcription_url: String,
    /// Base URL of the translation service.
    pub translation_url: String,
    /// Base URL of the speech synthesis service.
    pub tts_url: String,
    /// Per-call timeout. Latency beyond this surfaces as a per-call failure,
    /// never as a crash.
    pub request_timeout: Duration,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            transcription_url: "http://localhost:9000".to_string(),
            translation_url: "http://localhost:9001".to_string(),
            tts_url: "http://localhost:9002".to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl ServicesConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            transcription_url: std::env::var("TRANSCRIPTION_URL")
                .unwrap_or(defaults.transcription_url),
            translation_url: std::env::var("TRANSLATION_URL").unwrap_or(defaults.translation_url),
            tts_url: std::env::var("TTS_URL").unwrap_or(defaults.tts_url),
            request_timeout: Duration::from_secs(
                std::env::var("SERVICE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        }
    }
}
