//! Crop recommendation history repository.

use cbams_models::{CropRecommendationRecord, CropSuggestion, SoilConditions, UserId};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::pool::DatabasePool;
use crate::rows::{format_datetime, parse_datetime, parse_uuid};

const TABLE: &str = "crop_recommendations";

/// Repository for recommendation history.
#[derive(Clone)]
pub struct CropRecommendationRepository {
    pool: DatabasePool,
}

impl CropRecommendationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Record the readings a user submitted and what the model suggested.
    pub async fn create(
        &self,
        user_id: &UserId,
        input: &SoilConditions,
        recommendations: &[CropSuggestion],
    ) -> StoreResult<CropRecommendationRecord> {
        let record = CropRecommendationRecord {
            id: Uuid::new_v4(),
            user_id: user_id.clone(),
            recommendations: recommendations.to_vec(),
            input_data: input.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"INSERT INTO crop_recommendations (id, user_id, recommendations, input_data, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(record.id.to_string())
        .bind(record.user_id.as_str())
        .bind(serde_json::to_string(&record.recommendations)?)
        .bind(serde_json::to_string(&record.input_data)?)
        .bind(format_datetime(&record.created_at))
        .execute(&self.pool.writer)
        .await?;

        Ok(record)
    }

    /// A user's history, newest first.
    pub async fn list_for_user(&self, user_id: &UserId) -> StoreResult<Vec<CropRecommendationRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM crop_recommendations WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool.reader)
        .await?;

        rows.iter().map(from_row).collect()
    }
}

fn from_row(row: &SqliteRow) -> StoreResult<CropRecommendationRecord> {
    let id: String = row.try_get("id")?;
    let recommendations: String = row.try_get("recommendations")?;
    let input_data: String = row.try_get("input_data")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(CropRecommendationRecord {
        id: parse_uuid(TABLE, &id)?,
        user_id: UserId(row.try_get("user_id")?),
        recommendations: serde_json::from_str(&recommendations)?,
        input_data: serde_json::from_str(&input_data)?,
        created_at: parse_datetime(TABLE, &created_at)?,
    })
}
