//! Speech synthesis interface, voice selection and HTTP adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use vodub_models::VoicePreference;

use crate::config::ServicesConfig;
use crate::error::{ServiceError, ServiceResult};

/// Converts target-language text into an audio clip (encoded bytes, mp3).
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        locale: &str,
        preference: VoicePreference,
    ) -> ServiceResult<Vec<u8>>;
}

/// Gender tag carried by the voice catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceGender {
    Female,
    Male,
}

impl From<VoicePreference> for VoiceGender {
    fn from(p: VoicePreference) -> Self {
        match p {
            VoicePreference::Female => VoiceGender::Female,
            VoicePreference::Male => VoiceGender::Male,
        }
    }
}

/// One installable voice as reported by the synthesis service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voice {
    #[serde(rename = "ShortName")]
    pub short_name: String,
    #[serde(rename = "Locale")]
    pub locale: String,
    #[serde(rename = "Gender")]
    pub gender: VoiceGender,
}

/// The set of voices a synthesis service offers.
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
}

impl VoiceCatalog {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self { voices }
    }

    /// Select a voice for (locale, preference).
    ///
    /// Prefers a voice matching both; falls back to the opposite gender for
    /// the same locale; errors with `NoVoiceAvailable` when the locale has no
    /// voices at all. Selection is deterministic (first match) so repeated
    /// synthesis of the same job picks the same voice.
    pub fn select(&self, locale: &str, preference: VoicePreference) -> ServiceResult<&Voice> {
        let for_locale = |gender: VoiceGender| {
            self.voices
                .iter()
                .find(|v| v.locale.eq_ignore_ascii_case(locale) && v.gender == gender)
        };

        for_locale(preference.into())
            .or_else(|| for_locale(preference.opposite().into()))
            .ok_or_else(|| ServiceError::NoVoiceAvailable {
                locale: locale.to_string(),
            })
    }
}

/// HTTP adapter for an edge-tts style synthesis service: a voice listing
/// endpoint plus a text-to-audio endpoint.
pub struct HttpSynthesizer {
    client: reqwest::Client,
    base_url: String,
    catalog: tokio::sync::OnceCell<VoiceCatalog>,
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    voice: &'a str,
}

impl HttpSynthesizer {
    pub fn new(config: &ServicesConfig) -> ServiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.tts_url.trim_end_matches('/').to_string(),
            catalog: tokio::sync::OnceCell::new(),
        })
    }

    /// Fetch (and cache) the voice catalog.
    async fn catalog(&self) -> ServiceResult<&VoiceCatalog> {
        self.catalog
            .get_or_try_init(|| async {
                let response = self
                    .client
                    .get(format!("{}/voices", self.base_url))
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    return Err(ServiceError::BadStatus {
                        status: status.as_u16(),
                        detail: response.text().await.unwrap_or_default(),
                    });
                }

                let voices: Vec<Voice> = response.json().await?;
                debug!(voices = voices.len(), "Fetched voice catalog");
                Ok(VoiceCatalog::new(voices))
            })
            .await
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        locale: &str,
        preference: VoicePreference,
    ) -> ServiceResult<Vec<u8>> {
        let voice = self.catalog().await?.select(locale, preference)?.clone();

        let response = self
            .client
            .post(format!("{}/synthesize", self.base_url))
            .json(&SynthesizeRequest {
                text,
                voice: &voice.short_name,
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

        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(ServiceError::invalid_response(
                "synthesis returned an empty audio body",
            ));
        }

        debug!(
            voice = %voice.short_name,
            bytes = bytes.len(),
            "Synthesis complete"
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalog() -> VoiceCatalog {
        VoiceCatalog::new(vec![
            Voice {
                short_name: "ta-IN-PallaviNeural".into(),
                locale: "ta-IN".into(),
                gender: VoiceGender::Female,
            },
            Voice {
                short_name: "ta-IN-ValluvarNeural".into(),
                locale: "ta-IN".into(),
                gender: VoiceGender::Male,
            },
            Voice {
                short_name: "hi-IN-SwaraNeural".into(),
                locale: "hi-IN".into(),
                gender: VoiceGender::Female,
            },
        ])
    }

    #[test]
    fn test_select_preferred_gender() {
        let catalog = catalog();
        let voice = catalog.select("ta-IN", VoicePreference::Male).unwrap();
        assert_eq!(voice.short_name, "ta-IN-ValluvarNeural");
    }

    #[test]
    fn test_select_falls_back_to_opposite_gender() {
        // hi-IN only has a female voice.
        let catalog = catalog();
        let voice = catalog.select("hi-IN", VoicePreference::Male).unwrap();
        assert_eq!(voice.short_name, "hi-IN-SwaraNeural");
    }

    #[test]
    fn test_select_no_voice_for_locale() {
        let err = catalog()
            .select("fr-FR", VoicePreference::Female)
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoVoiceAvailable { .. }));
    }

    #[test]
    fn test_select_locale_case_insensitive() {
        let catalog = catalog();
        let voice = catalog.select("TA-in", VoicePreference::Female).unwrap();
        assert_eq!(voice.short_name, "ta-IN-PallaviNeural");
    }

    #[tokio::test]
    async fn test_http_synthesize() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/voices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"ShortName": "ta-IN-PallaviNeural", "Locale": "ta-IN", "Gender": "Female"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/synthesize"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3mp3data".to_vec()))
            .mount(&server)
            .await;

        let config = ServicesConfig {
            tts_url: server.uri(),
            ..Default::default()
        };
        let synth = HttpSynthesizer::new(&config).unwrap();
        let audio = synth
            .synthesize("வணக்கம்", "ta-IN", VoicePreference::Female)
            .await
            .unwrap();
        assert_eq!(audio, b"ID3mp3data");
    }

    #[tokio::test]
    async fn test_http_synthesize_no_voice() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/voices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let config = ServicesConfig {
            tts_url: server.uri(),
            ..Default::default()
        };
        let synth = HttpSynthesizer::new(&config).unwrap();
        let err = synth
            .synthesize("text", "ta-IN", VoicePreference::Female)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoVoiceAvailable { .. }));
    }
}
