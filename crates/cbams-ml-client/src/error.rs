//! ML client error types.

use thiserror::Error;

pub type MlResult<T> = Result<T, MlError>;

#[derive(Debug, Error)]
pub enum MlError {
    #[error("ML service unavailable: {status}: {body}")]
    ServiceUnavailable { status: u16, body: String },

    #[error("Request failed: {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MlError {
    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        if status >= 500 {
            MlError::ServiceUnavailable { status, body }
        } else {
            MlError::RequestFailed { status, body }
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            MlError::ServiceUnavailable { .. } => true,
            MlError::Network(e) => !e.is_builder(),
            _ => false,
        }
    }

    /// HTTP status reported by the ML service, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            MlError::ServiceUnavailable { status, .. } | MlError::RequestFailed { status, .. } => {
                Some(*status)
            }
            MlError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
