//! Application state.

use std::sync::Arc;

use vodub_pipeline::{DubbingConfig, DubbingController, Services};
use vodub_services::{HttpSynthesizer, HttpTranscriber, HttpTranslator, ServicesConfig};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub controller: Arc<DubbingController>,
}

impl AppState {
    /// Wire the service adapters and the controller from the environment and
    /// create the storage roots.
    pub async fn new(config: ApiConfig) -> ApiResult<Self> {
        let services_config = ServicesConfig::from_env();
        let services = Services {
            transcriber: Arc::new(
                HttpTranscriber::new(&services_config)
                    .map_err(|e| ApiError::internal(format!("transcriber setup: {e}")))?,
            ),
            translator: Arc::new(
                HttpTranslator::new(&services_config)
                    .map_err(|e| ApiError::internal(format!("translator setup: {e}")))?,
            ),
            synthesizer: Arc::new(
                HttpSynthesizer::new(&services_config)
                    .map_err(|e| ApiError::internal(format!("synthesizer setup: {e}")))?,
            ),
        };

        let controller = DubbingController::new(DubbingConfig::from_env(), services);
        controller.init().await?;

        Ok(Self {
            config,
            controller: Arc::new(controller),
        })
    }
}
