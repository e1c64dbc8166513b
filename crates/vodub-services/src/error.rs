//! Service adapter error types.

use thiserror::Error;

/// Result type for service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from external service adapters.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Service request failed: {0}")]
    RequestFailed(String),

    #[error("Service returned {status}: {detail}")]
    BadStatus { status: u16, detail: String },

    #[error("Unexpected service response: {0}")]
    InvalidResponse(String),

    #[error("No voice available for locale {locale}")]
    NoVoiceAvailable { locale: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
