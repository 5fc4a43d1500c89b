//! ML gateway handlers.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use cbams_ml_client::{MlResult, PredictionRequest};
use cbams_models::{
    CropProgress, DiseaseDetectionResponse, FarmId, HealthAnalysis, NewCropImage,
    RecommendationResponse, SoilConditions,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::uploads::{ImageForm, SpooledFile};

/// Response for a crop image analysis.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropHealthUploadResponse {
    pub success: bool,
    pub image_id: Uuid,
    pub analysis: HealthAnalysis,
}

/// Rank crops for soil readings and keep the result in the user's history.
pub async fn crop_recommendation(
    State(state): State<AppState>,
    user: AuthUser,
    Json(soil): Json<SoilConditions>,
) -> ApiResult<Json<RecommendationResponse>> {
    const FAILED: &str = "Failed to get crop recommendation";

    let response = state
        .ml
        .recommend_crop(&soil)
        .await
        .map_err(ApiError::ml(FAILED))?;

    state
        .recommendations
        .create(&user.id, &soil, &response.recommendations)
        .await
        .map_err(ApiError::store(FAILED))?;

    info!(
        user_id = %user.id,
        count = response.recommendations.len(),
        "Crop recommendation stored"
    );

    Ok(Json(response))
}

/// Analyze a crop image and record the result for progress tracking.
pub async fn analyze_crop_health(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> ApiResult<Json<CropHealthUploadResponse>> {
    const FAILED: &str = "Failed to analyze crop image";

    let mut form = ImageForm::from_multipart(multipart).await?;
    let image = form.require_image()?;
    let farm_id = FarmId::from_optional(form.farm_id.as_deref());
    let crop_type = form
        .crop_type
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(NewCropImage::UNKNOWN_CROP)
        .to_string();

    let spooled = state.uploads.spool(&image).await?;
    let result = async {
        let request = load(&spooled)
            .await?
            .with_field("userId", user.id.as_str())
            .with_field("cropType", crop_type.as_str())
            .with_field("farmId", farm_id.as_str());
        state.ml.analyze_crop_health(&request).await
    }
    .await;
    spooled.remove().await;

    let response = result.map_err(ApiError::ml(FAILED))?;

    let record = state
        .crop_images
        .create(&NewCropImage::from_response(
            user.id.clone(),
            farm_id,
            Some(crop_type.as_str()),
            &response,
        ))
        .await
        .map_err(ApiError::store(FAILED))?;

    info!(
        user_id = %user.id,
        image_id = %record.id,
        health_score = record.health_score,
        "Crop image analyzed"
    );

    Ok(Json(CropHealthUploadResponse {
        success: true,
        image_id: record.id,
        analysis: response.analysis,
    }))
}

/// Classify leaf disease. Results are not stored.
pub async fn detect_disease(
    State(state): State<AppState>,
    _user: AuthUser,
    multipart: Multipart,
) -> ApiResult<Json<DiseaseDetectionResponse>> {
    let mut form = ImageForm::from_multipart(multipart).await?;
    let image = form.require_image()?;

    let spooled = state.uploads.spool(&image).await?;
    let result = async { state.ml.detect_disease(&load(&spooled).await?).await }.await;
    spooled.remove().await;

    result
        .map(Json)
        .map_err(ApiError::ml("Failed to detect disease"))
}

/// Progress for the default farm.
pub async fn crop_progress(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<CropProgress>> {
    progress_for(&state, &user, FarmId::default()).await
}

/// Progress for a named farm.
pub async fn crop_progress_for_farm(
    State(state): State<AppState>,
    user: AuthUser,
    Path(farm_id): Path<String>,
) -> ApiResult<Json<CropProgress>> {
    progress_for(&state, &user, FarmId::from_optional(Some(&farm_id))).await
}

async fn progress_for(state: &AppState, user: &AuthUser, farm_id: FarmId) -> ApiResult<Json<CropProgress>> {
    let images = state
        .crop_images
        .list_for_farm(&user.id, &farm_id)
        .await
        .map_err(ApiError::store("Failed to get crop progress"))?;

    Ok(Json(CropProgress::from_images(&images)))
}

async fn load(spooled: &SpooledFile) -> MlResult<PredictionRequest> {
    PredictionRequest::from_path(spooled.path(), spooled.content_type()).await
}
