//! Crop image analysis repository.

use cbams_models::{
    CropImageRecord, FarmId, HealthAnalysis, HealthStatus, NewCropImage, UserId,
};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::pool::DatabasePool;
use crate::rows::{format_datetime, parse_datetime, parse_uuid};

const TABLE: &str = "crop_images";

/// Repository for analyzed crop images.
#[derive(Clone)]
pub struct CropImageRepository {
    pool: DatabasePool,
}

impl CropImageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Insert an analysis, stamped with the current time.
    pub async fn create(&self, new: &NewCropImage) -> StoreResult<CropImageRecord> {
        let record = CropImageRecord {
            id: Uuid::new_v4(),
            user_id: new.user_id.clone(),
            farm_id: new.farm_id.clone(),
            image_url: new.image_url.clone(),
            crop_type: new.crop_type.clone(),
            health_score: new.analysis.health_score,
            status: new.analysis.status,
            analysis_data: new.analysis.clone(),
            upload_date: Utc::now(),
        };

        sqlx::query(
            r#"INSERT INTO crop_images
                   (id, user_id, farm_id, image_url, crop_type, health_score, status, analysis_data, upload_date)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(record.id.to_string())
        .bind(record.user_id.as_str())
        .bind(record.farm_id.as_str())
        .bind(&record.image_url)
        .bind(&record.crop_type)
        .bind(record.health_score)
        .bind(record.status.as_str())
        .bind(serde_json::to_string(&record.analysis_data)?)
        .bind(format_datetime(&record.upload_date))
        .execute(&self.pool.writer)
        .await?;

        debug!(image_id = %record.id, user_id = %record.user_id, farm_id = %record.farm_id, "Stored crop image analysis");

        Ok(record)
    }

    /// Fetch one analysis by id.
    pub async fn get(&self, id: Uuid) -> StoreResult<Option<CropImageRecord>> {
        let row = sqlx::query("SELECT * FROM crop_images WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await?;

        row.as_ref().map(from_row).transpose()
    }

    /// All analyses for a user's farm, oldest first.
    pub async fn list_for_farm(
        &self,
        user_id: &UserId,
        farm_id: &FarmId,
    ) -> StoreResult<Vec<CropImageRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM crop_images WHERE user_id = ? AND farm_id = ? ORDER BY upload_date ASC",
        )
        .bind(user_id.as_str())
        .bind(farm_id.as_str())
        .fetch_all(&self.pool.reader)
        .await?;

        rows.iter().map(from_row).collect()
    }
}

fn from_row(row: &SqliteRow) -> StoreResult<CropImageRecord> {
    let id: String = row.try_get("id")?;
    let status: String = row.try_get("status")?;
    let analysis: String = row.try_get("analysis_data")?;
    let upload_date: String = row.try_get("upload_date")?;

    let status = HealthStatus::parse(&status)
        .ok_or_else(|| StoreError::corrupt(TABLE, format!("unknown status {}", status)))?;
    let analysis_data: HealthAnalysis = serde_json::from_str(&analysis)?;

    Ok(CropImageRecord {
        id: parse_uuid(TABLE, &id)?,
        user_id: UserId(row.try_get("user_id")?),
        farm_id: FarmId(row.try_get("farm_id")?),
        image_url: row.try_get("image_url")?,
        crop_type: row.try_get("crop_type")?,
        health_score: row.try_get("health_score")?,
        status,
        analysis_data,
        upload_date: parse_datetime(TABLE, &upload_date)?,
    })
}
