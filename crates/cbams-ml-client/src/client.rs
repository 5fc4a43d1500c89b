//! ML service HTTP client.

use std::time::{Duration, Instant};

use cbams_models::{
    DiseaseDetectionResponse, HealthAnalysisResponse, RecommendationResponse, SoilConditions,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::{MlError, MlResult};
use crate::metrics::{record_request, record_retry};
use crate::types::{HealthResponse, PredictionRequest};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5001/api/ml";

/// Configuration for ML client.
#[derive(Debug, Clone)]
pub struct MlClientConfig {
    /// Base URL of the ML API, including the `/api/ml` prefix
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
    /// First backoff delay, doubled per attempt
    pub retry_base_delay: Duration,
}

impl Default for MlClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl MlClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("ML_SERVICE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("ML_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_retries: std::env::var("ML_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            ..Self::default()
        }
    }
}

/// Client for the Python ML service.
#[derive(Clone)]
pub struct MlClient {
    http: Client,
    config: MlClientConfig,
    base_url: String,
    health_url: String,
}

impl MlClient {
    /// Create a new ML client.
    pub fn new(config: MlClientConfig) -> MlResult<Self> {
        let parsed = Url::parse(&config.base_url)
            .map_err(|e| MlError::Config(format!("invalid ML_SERVICE_URL {}: {}", config.base_url, e)))?;
        let health_url = format!("{}/health", parsed.origin().ascii_serialization());
        let base_url = config.base_url.trim_end_matches('/').to_string();

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("cbams-ml-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(MlError::Network)?;

        Ok(Self {
            http,
            config,
            base_url,
            health_url,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> MlResult<Self> {
        Self::new(MlClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if ML service is healthy.
    pub async fn health_check(&self) -> MlResult<bool> {
        match self.http.get(&self.health_url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("ML service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("ML service health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Rank crops for the given soil readings.
    pub async fn recommend_crop(&self, soil: &SoilConditions) -> MlResult<RecommendationResponse> {
        let url = self.endpoint("crop-recommendation");
        self.execute("crop_recommendation", || Ok(self.http.post(&url).json(soil)))
            .await
    }

    /// Upload a crop image for health analysis.
    pub async fn analyze_crop_health(
        &self,
        request: &PredictionRequest,
    ) -> MlResult<HealthAnalysisResponse> {
        let url = self.endpoint("analyze-crop-health");
        self.execute("analyze_crop_health", || {
            Ok(self.http.post(&url).multipart(request.to_form()?))
        })
        .await
    }

    /// Upload a leaf image for disease detection.
    pub async fn detect_disease(
        &self,
        request: &PredictionRequest,
    ) -> MlResult<DiseaseDetectionResponse> {
        let url = self.endpoint("detect-disease");
        self.execute("detect_disease", || {
            Ok(self.http.post(&url).multipart(request.to_form()?))
        })
        .await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send with retry, then check status and decode the body.
    async fn execute<T, F>(&self, operation: &'static str, build: F) -> MlResult<T>
    where
        T: DeserializeOwned,
        F: Fn() -> MlResult<RequestBuilder>,
    {
        debug!(operation, "Sending ML request");
        let start = Instant::now();

        let result = self
            .with_retry(operation, || async {
                let response = build()?.send().await?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(MlError::from_http_status(status.as_u16(), body));
                }
                Ok(response.text().await?)
            })
            .await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(_) => "error",
        };
        record_request(operation, outcome, start.elapsed().as_secs_f64());

        let body = result?;
        serde_json::from_str(&body).map_err(|e| {
            warn!(operation, "ML service returned an unexpected body: {}", e);
            MlError::InvalidResponse(e.to_string())
        })
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: &'static str, op: F) -> MlResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = MlResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_base_delay * 2u32.pow(attempt);
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "ML request failed, retrying: {}",
                        e
                    );
                    record_retry(operation);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
