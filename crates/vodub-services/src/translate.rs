//! Translation service interface and HTTP adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ServicesConfig;
use crate::error::{ServiceError, ServiceResult};

/// Converts source-language text into target-language text.
#[async_trait]
pub trait TranslationService: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> ServiceResult<String>;
}

/// HTTP adapter: JSON in, JSON out, source language auto-detected.
pub struct HttpTranslator {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source: &'a str,
    target: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translated_text: Option<String>,
}

impl HttpTranslator {
    pub fn new(config: &ServicesConfig) -> ServiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.translation_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TranslationService for HttpTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> ServiceResult<String> {
        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&TranslateRequest {
                text,
                source: "auto",
                target: target_language,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::BadStatus {
                status: status.as_u16(),
                detail: response.text().await.unwrap_or_default(),
            });
        }

        let body: TranslateResponse = response.json().await?;
        let translated = body.translated_text.unwrap_or_default();
        debug!(target = target_language, chars = translated.len(), "Translation complete");
        Ok(translated)
    }
}
