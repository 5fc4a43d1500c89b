//! Crop progress derived from a farm's image history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::health::{CropImageRecord, HealthStatus};

/// Days between consecutive submissions on the progress timeline.
pub const DAYS_PER_SUBMISSION: u32 = 10;

/// One point on the progress timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    pub day: u32,
    pub health_score: f64,
    pub status: HealthStatus,
    pub date: DateTime<Utc>,
    pub image_url: String,
}

/// Progress summary for a farm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropProgress {
    pub success: bool,
    pub progress: Vec<ProgressPoint>,
    pub total_submissions: usize,
    /// Percent change from first to last score, two decimals.
    pub improvement_score: String,
    pub current_health: f64,
}

impl CropProgress {
    /// Build the summary from images sorted by upload date, oldest first.
    pub fn from_images(images: &[CropImageRecord]) -> Self {
        let progress = images
            .iter()
            .enumerate()
            .map(|(index, img)| ProgressPoint {
                day: (index as u32 + 1) * DAYS_PER_SUBMISSION,
                health_score: img.health_score,
                status: img.status,
                date: img.upload_date,
                image_url: img.image_url.clone(),
            })
            .collect();

        Self {
            success: true,
            progress,
            total_submissions: images.len(),
            improvement_score: format!("{:.2}", improvement(images)),
            current_health: images.last().map(|img| img.health_score).unwrap_or(0.0),
        }
    }
}

fn improvement(images: &[CropImageRecord]) -> f64 {
    match (images.first(), images.last()) {
        (Some(first), Some(last)) if images.len() > 1 && first.health_score != 0.0 => {
            (last.health_score - first.health_score) / first.health_score * 100.0
        }
        _ => 0.0,
    }
}
