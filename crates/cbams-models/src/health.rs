//! Crop-health and disease models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::ids::{FarmId, UserId};

/// Health band assigned by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Excellent => "Excellent",
            HealthStatus::Good => "Good",
            HealthStatus::Fair => "Fair",
            HealthStatus::Poor => "Poor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Excellent" => Some(HealthStatus::Excellent),
            "Good" => Some(HealthStatus::Good),
            "Fair" => Some(HealthStatus::Fair),
            "Poor" => Some(HealthStatus::Poor),
            _ => None,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Share of the image in each vegetation band, in percent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthMetrics {
    #[serde(default)]
    pub healthy_percent: f64,
    #[serde(default)]
    pub stressed_percent: f64,
    #[serde(default)]
    pub diseased_percent: f64,
}

/// Crop-health analysis produced by the ML service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthAnalysis {
    pub health_score: f64,
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub metrics: HealthMetrics,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
}

/// Response of the ML service's crop-health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthAnalysisResponse {
    #[serde(default)]
    pub success: bool,
    pub analysis: HealthAnalysis,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Disease classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disease {
    pub name: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub treatment: String,
}

impl Disease {
    pub fn is_healthy(&self) -> bool {
        self.name == "Healthy"
    }
}

/// Disease severity band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Severity {
    pub level: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Disease detection result. The analyzer reports its own failures inline
/// through `error`, with `disease_detected` false.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseDetection {
    pub disease_detected: bool,
    pub disease: Disease,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of the ML service's disease detection endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseDetectionResponse {
    #[serde(default)]
    pub success: bool,
    pub detection: DiseaseDetection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Crop image analysis as stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropImageRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub farm_id: FarmId,
    pub image_url: String,
    pub crop_type: String,
    pub health_score: f64,
    pub status: HealthStatus,
    pub analysis_data: HealthAnalysis,
    pub upload_date: DateTime<Utc>,
}

/// Insert payload for a crop image analysis.
#[derive(Debug, Clone)]
pub struct NewCropImage {
    pub user_id: UserId,
    pub farm_id: FarmId,
    pub crop_type: String,
    pub image_url: String,
    pub analysis: HealthAnalysis,
}

impl NewCropImage {
    pub const UNKNOWN_CROP: &'static str = "unknown";

    /// Build from an ML response. Blank crop types are recorded as `unknown`.
    pub fn from_response(
        user_id: UserId,
        farm_id: FarmId,
        crop_type: Option<&str>,
        response: &HealthAnalysisResponse,
    ) -> Self {
        let crop_type = match crop_type.map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => Self::UNKNOWN_CROP.to_string(),
        };

        Self {
            user_id,
            farm_id,
            crop_type,
            image_url: response.image_url.clone(),
            analysis: response.analysis.clone(),
        }
    }
}
