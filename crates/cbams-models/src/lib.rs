//! Shared data models for the CBAMS gateway.
//!
//! This crate provides Serde-serializable types for:
//! - User and farm identifiers
//! - Soil readings and crop recommendations
//! - Crop-health analyses and disease detections returned by the ML service
//! - Persisted crop image records and derived crop progress

pub mod health;
pub mod ids;
pub mod progress;
pub mod recommendation;

// Re-export common types
pub use health::{
    CropImageRecord, Disease, DiseaseDetection, DiseaseDetectionResponse, HealthAnalysis,
    HealthAnalysisResponse, HealthMetrics, HealthStatus, NewCropImage, Severity,
};
pub use ids::{FarmId, UserId};
pub use progress::{CropProgress, ProgressPoint};
pub use recommendation::{
    CropRecommendationRecord, CropSuggestion, RecommendationResponse, SoilConditions,
};
