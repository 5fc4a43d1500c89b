//! Client for the Python ML service.
//!
//! The service scores crops from soil readings and analyzes uploaded crop
//! images (health and disease). JSON requests go to `crop-recommendation`;
//! image uploads are sent as multipart bodies with the file in the `image`
//! part.

pub mod client;
pub mod error;
pub mod metrics;
pub mod types;

pub use client::{MlClient, MlClientConfig};
pub use error::{MlError, MlResult};
pub use types::{HealthResponse, PredictionRequest};
