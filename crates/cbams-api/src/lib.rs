//! Axum HTTP gateway for the crop ML service.
//!
//! This crate provides:
//! - Crop recommendation, crop-health upload, disease detection and crop
//!   progress routes under `/api/ml`
//! - Bearer-token (HS256 JWT) authentication
//! - Liveness/readiness probes and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod uploads;

pub use auth::{AuthUser, Claims, JwtVerifier};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
