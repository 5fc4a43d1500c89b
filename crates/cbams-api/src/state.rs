//! Application state.

use std::sync::Arc;

use cbams_ml_client::{MlClient, MlError};
use cbams_store::{CropImageRepository, CropRecommendationRepository, DatabasePool, StoreError};
use thiserror::Error;

use crate::auth::JwtVerifier;
use crate::config::ApiConfig;
use crate::uploads::UploadSpool;

/// Startup failure while wiring dependencies.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("JWT_SECRET must be set")]
    MissingJwtSecret,

    #[error("ML client: {0}")]
    Ml(#[from] MlError),

    #[error("database: {0}")]
    Store(#[from] StoreError),

    #[error("upload directory {path}: {source}")]
    UploadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub ml: Arc<MlClient>,
    pub db: DatabasePool,
    pub crop_images: CropImageRepository,
    pub recommendations: CropRecommendationRepository,
    pub uploads: UploadSpool,
    pub jwt: Arc<JwtVerifier>,
}

impl AppState {
    /// Create application state from the environment.
    pub async fn new(config: ApiConfig) -> Result<Self, StateError> {
        let ml = MlClient::from_env()?;
        let db = DatabasePool::from_env().await?;
        Self::from_parts(config, ml, db).await
    }

    /// Assemble state around an existing ML client and pool.
    pub async fn from_parts(
        config: ApiConfig,
        ml: MlClient,
        db: DatabasePool,
    ) -> Result<Self, StateError> {
        if config.jwt_secret.is_empty() {
            return Err(StateError::MissingJwtSecret);
        }

        let uploads = UploadSpool::new(&config.upload_dir, config.max_upload_size)
            .await
            .map_err(|source| StateError::UploadDir {
                path: config.upload_dir.display().to_string(),
                source,
            })?;
        let jwt = JwtVerifier::new(&config.jwt_secret);

        Ok(Self {
            crop_images: CropImageRepository::new(db.clone()),
            recommendations: CropRecommendationRepository::new(db.clone()),
            ml: Arc::new(ml),
            db,
            uploads,
            jwt: Arc::new(jwt),
            config,
        })
    }
}
