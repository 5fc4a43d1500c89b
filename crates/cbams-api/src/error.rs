//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cbams_ml_client::MlError;
use cbams_store::StoreError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::config::is_production_environment;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{context}: {source}")]
    Ml {
        context: &'static str,
        #[source]
        source: MlError,
    },

    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl From<MlError> for ApiError {
    fn from(source: MlError) -> Self {
        Self::Ml {
            context: "ML service request failed",
            source,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(source: StoreError) -> Self {
        Self::Store {
            context: "Database error",
            source,
        }
    }
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Wrap an ML failure under a route-specific message, for `map_err`.
    pub fn ml(context: &'static str) -> impl FnOnce(MlError) -> Self {
        move |source| Self::Ml { context, source }
    }

    /// Wrap a store failure under a route-specific message, for `map_err`.
    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { context, source }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) | ApiError::Ml { .. } | ApiError::Store { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Message safe to show when internal details are hidden.
    fn public_detail(&self) -> &str {
        match self {
            ApiError::Ml { context, .. } | ApiError::Store { context, .. } => context,
            _ => "An internal error occurred",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let detail = if self.is_internal() {
            error!("Request failed: {}", self);
            if is_production_environment(&std::env::var("ENVIRONMENT").unwrap_or_default()) {
                self.public_detail().to_string()
            } else {
                self.to_string()
            }
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}
