//! Crop recommendation models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::UserId;

/// Soil and weather readings submitted for a crop recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilConditions {
    /// Nitrogen content (kg/ha)
    pub nitrogen: f64,
    /// Phosphorus content (kg/ha)
    pub phosphorus: f64,
    /// Potassium content (kg/ha)
    pub potassium: f64,
    /// Temperature (°C)
    pub temperature: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Soil pH
    pub ph: f64,
    /// Rainfall (mm)
    pub rainfall: f64,
}

/// A single ranked crop suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropSuggestion {
    pub crop: String,
    /// Suitability as a percentage (0-100)
    pub suitability: f64,
    pub reason: String,
}

/// Response of the ML service's crop recommendation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<CropSuggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Persisted recommendation, kept for the user's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRecommendationRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub recommendations: Vec<CropSuggestion>,
    pub input_data: SoilConditions,
    pub created_at: DateTime<Utc>,
}
