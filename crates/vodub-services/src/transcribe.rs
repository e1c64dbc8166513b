//! Speech-to-text service interface and HTTP adapter.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::config::ServicesConfig;
use crate::error::{ServiceError, ServiceResult};

/// Converts a speech clip into source-language text.
///
/// An empty string is a valid result: the service heard nothing intelligible.
/// Callers must not treat that as an error.
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    async fn transcribe(&self, clip: &Path, language: &str) -> ServiceResult<String>;
}

/// HTTP adapter: uploads the wav clip as multipart form data and expects a
/// JSON `{"text": "..."}` body.
pub struct HttpTranscriber {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: Option<String>,
}

impl HttpTranscriber {
    pub fn new(config: &ServicesConfig) -> ServiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.transcription_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TranscriptionService for HttpTranscriber {
    async fn transcribe(&self, clip: &Path, language: &str) -> ServiceResult<String> {
        let bytes = tokio::fs::read(clip).await?;
        let filename = clip
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "clip.wav".to_string());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str("audio/wav")
            .map_err(ServiceError::Http)?;
        let form = reqwest::multipart::Form::new()
            .part("audio", part)
            .text("language", language.to_string());

        let response = self
            .client
            .post(format!("{}/transcribe", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::BadStatus {
                status: status.as_u16(),
                detail: response.text().await.unwrap_or_default(),
            });
        }

        let body: TranscriptionResponse = response.json().await?;
        let text = body.text.unwrap_or_default().trim().to_string();
        debug!(clip = %clip.display(), chars = text.len(), "Transcription complete");
        Ok(text)
    }
}
