//! Router tests against a mocked ML service and a temporary SQLite database.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use cbams_api::{create_router, ApiConfig, AppState};
use cbams_ml_client::{MlClient, MlClientConfig};
use cbams_models::{FarmId, HealthAnalysis, HealthMetrics, HealthStatus, NewCropImage, UserId};
use cbams_store::DatabasePool;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_json, body_string_contains, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "integration-secret";
const BOUNDARY: &str = "cbams-test-boundary";

struct TestApp {
    router: Router,
    state: AppState,
    ml: MockServer,
    _dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let ml = MockServer::start().await;

        let client = MlClient::new(MlClientConfig {
            base_url: format!("{}/api/ml", ml.uri()),
            timeout: Duration::from_secs(5),
            max_retries: 0,
            retry_base_delay: Duration::from_millis(1),
        })
        .unwrap();

        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("api.db").display());
        let db = DatabasePool::new(&db_url).await.unwrap();

        let config = ApiConfig {
            upload_dir: dir.path().join("uploads"),
            jwt_secret: SECRET.to_string(),
            ..ApiConfig::default()
        };

        let state = AppState::from_parts(config, client, db).await.unwrap();
        let router = create_router(state.clone(), None);

        Self {
            router,
            state,
            ml,
            _dir: dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn spooled_files(&self) -> usize {
        std::fs::read_dir(self.state.uploads.dir()).unwrap().count()
    }
}

fn token(user_id: &str) -> String {
    let exp = chrono::Utc::now().timestamp() + 3600;
    encode(
        &Header::default(),
        &json!({"id": user_id, "role": "farmer", "exp": exp}),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

enum FormPart<'a> {
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

fn multipart_body(parts: &[FormPart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            FormPart::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}", name, value)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(uri: &str, user_id: &str, parts: &[FormPart<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token(user_id)))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn leaf_image<'a>(content_type: &'a str, bytes: &'a [u8]) -> FormPart<'a> {
    FormPart::File {
        name: "image",
        file_name: "leaf.jpg",
        content_type,
        bytes,
    }
}

fn health_response(score: f64, status: &str) -> Value {
    json!({
        "success": true,
        "analysis": {
            "healthScore": score,
            "status": status,
            "color": "lightgreen",
            "metrics": {"healthy_percent": 60.0, "stressed_percent": 20.0, "diseased_percent": 5.0},
            "recommendations": ["Continue current farming practices"],
            "cropType": "wheat"
        },
        "imageUrl": "/uploads/u-1_north_20240301_leaf.jpg",
        "timestamp": "2024-03-01T08:00:00"
    })
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new().await;

    for uri in ["/health", "/healthz"] {
        let (status, body) = app
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}

#[tokio::test]
async fn test_ready_when_dependencies_are_up() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "service": "CBAMS ML Service"
        })))
        .mount(&app.ml)
        .await;

    let (status, body) = app
        .send(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["database"]["status"], "ok");
    assert_eq!(body["checks"]["ml_service"]["status"], "ok");
}

#[tokio::test]
async fn test_ready_degraded_when_ml_service_down() {
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.ml)
        .await;

    let (status, body) = app
        .send(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["database"]["status"], "ok");
    assert_eq!(body["checks"]["ml_service"]["status"], "error");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Request::builder()
                .uri("/api/ml/crop-progress")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["detail"].as_str().unwrap().contains("Authorization"));
}

#[tokio::test]
async fn test_forged_token_is_unauthorized() {
    let app = TestApp::new().await;
    let exp = chrono::Utc::now().timestamp() + 3600;
    let forged = encode(
        &Header::default(),
        &json!({"id": "u-1", "exp": exp}),
        &EncodingKey::from_secret(b"someone-else"),
    )
    .unwrap();

    let (status, _) = app
        .send(
            Request::builder()
                .uri("/api/ml/crop-progress")
                .header(header::AUTHORIZATION, format!("Bearer {}", forged))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_crop_recommendation_is_forwarded_and_stored() {
    let app = TestApp::new().await;
    let soil = json!({
        "nitrogen": 90.0, "phosphorus": 42.0, "potassium": 43.0,
        "temperature": 20.8, "humidity": 82.0, "ph": 6.5, "rainfall": 202.9
    });
    let ml_response = json!({
        "recommendations": [
            {"crop": "Rice", "suitability": 91.2, "reason": "High rainfall and humidity"},
            {"crop": "Jute", "suitability": 74.0, "reason": "Warm and wet"}
        ],
        "timestamp": "2024-03-01T08:00:00"
    });

    Mock::given(method("POST"))
        .and(path("/api/ml/crop-recommendation"))
        .and(body_json(&soil))
        .respond_with(ResponseTemplate::new(200).set_body_json(&ml_response))
        .expect(1)
        .mount(&app.ml)
        .await;

    let (status, body) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/ml/crop-recommendation")
                .header(header::AUTHORIZATION, format!("Bearer {}", token("u-1")))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(soil.to_string()))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ml_response);

    let history = app
        .state
        .recommendations
        .list_for_user(&UserId::from("u-1"))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].recommendations[0].crop, "Rice");
    assert_eq!(history[0].input_data.rainfall, 202.9);
}

#[tokio::test]
async fn test_crop_recommendation_ml_failure_is_500() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .and(path("/api/ml/crop-recommendation"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "model not loaded"})))
        .mount(&app.ml)
        .await;

    let (status, body) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/ml/crop-recommendation")
                .header(header::AUTHORIZATION, format!("Bearer {}", token("u-1")))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "nitrogen": 1.0, "phosphorus": 1.0, "potassium": 1.0,
                        "temperature": 1.0, "humidity": 1.0, "ph": 7.0, "rainfall": 1.0
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Failed to get crop recommendation"));

    let history = app
        .state
        .recommendations
        .list_for_user(&UserId::from("u-1"))
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_analyze_crop_health_forwards_multipart_and_stores() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/api/ml/analyze-crop-health"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("name=\"image\""))
        .and(body_string_contains("leaf-bytes"))
        .and(body_string_contains("name=\"userId\"\r\n\r\nu-1"))
        .and(body_string_contains("name=\"cropType\"\r\n\r\nwheat"))
        .and(body_string_contains("name=\"farmId\"\r\n\r\nnorth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(health_response(68.25, "Good")))
        .expect(1)
        .mount(&app.ml)
        .await;

    let (status, body) = app
        .send(multipart_request(
            "/api/ml/analyze-crop-health",
            "u-1",
            &[
                leaf_image("image/jpeg", b"leaf-bytes"),
                FormPart::Text { name: "cropType", value: "wheat" },
                FormPart::Text { name: "farmId", value: "north" },
            ],
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["analysis"]["healthScore"], 68.25);
    assert_eq!(body["analysis"]["status"], "Good");

    let image_id: Uuid = body["imageId"].as_str().unwrap().parse().unwrap();
    let record = app.state.crop_images.get(image_id).await.unwrap().unwrap();
    assert_eq!(record.user_id, UserId::from("u-1"));
    assert_eq!(record.farm_id, FarmId::from("north"));
    assert_eq!(record.crop_type, "wheat");
    assert_eq!(record.status, HealthStatus::Good);
    assert_eq!(record.image_url, "/uploads/u-1_north_20240301_leaf.jpg");

    assert_eq!(app.spooled_files(), 0);
}

#[tokio::test]
async fn test_analyze_crop_health_defaults_farm_and_crop() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/api/ml/analyze-crop-health"))
        .and(body_string_contains("name=\"cropType\"\r\n\r\nunknown"))
        .and(body_string_contains("name=\"farmId\"\r\n\r\ndefault"))
        .respond_with(ResponseTemplate::new(200).set_body_json(health_response(40.0, "Fair")))
        .expect(1)
        .mount(&app.ml)
        .await;

    let (status, body) = app
        .send(multipart_request(
            "/api/ml/analyze-crop-health",
            "u-1",
            &[leaf_image("image/png", b"png-bytes")],
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    let image_id: Uuid = body["imageId"].as_str().unwrap().parse().unwrap();
    let record = app.state.crop_images.get(image_id).await.unwrap().unwrap();
    assert_eq!(record.farm_id, FarmId::default());
    assert_eq!(record.crop_type, NewCropImage::UNKNOWN_CROP);
}

#[tokio::test]
async fn test_analyze_crop_health_ml_failure_removes_spool() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .and(path("/api/ml/analyze-crop-health"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&app.ml)
        .await;

    let (status, body) = app
        .send(multipart_request(
            "/api/ml/analyze-crop-health",
            "u-1",
            &[leaf_image("image/jpeg", b"leaf-bytes")],
        ))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Failed to analyze crop image"));
    assert_eq!(app.spooled_files(), 0);

    let images = app
        .state
        .crop_images
        .list_for_farm(&UserId::from("u-1"), &FarmId::default())
        .await
        .unwrap();
    assert!(images.is_empty());
}

#[tokio::test]
async fn test_missing_image_is_bad_request() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.ml)
        .await;

    for uri in ["/api/ml/analyze-crop-health", "/api/ml/detect-disease"] {
        let (status, body) = app
            .send(multipart_request(
                uri,
                "u-1",
                &[FormPart::Text { name: "cropType", value: "wheat" }],
            ))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "No image uploaded");
    }
}

#[tokio::test]
async fn test_unsupported_image_type_is_bad_request() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.ml)
        .await;

    let (status, body) = app
        .send(multipart_request(
            "/api/ml/analyze-crop-health",
            "u-1",
            &[leaf_image("image/gif", b"GIF89a")],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("Only image files"));
    assert_eq!(app.spooled_files(), 0);
}

#[tokio::test]
async fn test_oversized_image_is_bad_request() {
    let app = TestApp::new().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.ml)
        .await;

    let big = vec![0u8; app.state.config.max_upload_size + 1];
    let (status, _) = app
        .send(multipart_request(
            "/api/ml/detect-disease",
            "u-1",
            &[leaf_image("image/jpeg", &big)],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.spooled_files(), 0);
}

#[tokio::test]
async fn test_detect_disease_returns_ml_response() {
    let app = TestApp::new().await;
    let ml_response = json!({
        "success": true,
        "detection": {
            "diseaseDetected": true,
            "disease": {
                "name": "Leaf Blight",
                "confidence": 87.5,
                "description": "Fungal infection of the leaf",
                "treatment": "Apply copper fungicide"
            },
            "severity": {"level": "Moderate", "score": 45.0, "color": "orange"},
            "recommendations": ["Remove infected leaves"]
        },
        "timestamp": "2024-03-01T08:00:00"
    });

    Mock::given(method("POST"))
        .and(path("/api/ml/detect-disease"))
        .and(body_string_contains("name=\"image\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(&ml_response))
        .expect(1)
        .mount(&app.ml)
        .await;

    let (status, body) = app
        .send(multipart_request(
            "/api/ml/detect-disease",
            "u-1",
            &[leaf_image("image/webp", b"webp-bytes")],
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ml_response);
    assert_eq!(app.spooled_files(), 0);
}

#[tokio::test]
async fn test_crop_progress() {
    let app = TestApp::new().await;
    let user = UserId::from("u-1");

    for (farm, score, status) in [
        ("default", 40.0, HealthStatus::Fair),
        ("default", 70.0, HealthStatus::Good),
        ("north", 90.0, HealthStatus::Excellent),
    ] {
        app.state
            .crop_images
            .create(&NewCropImage {
                user_id: user.clone(),
                farm_id: FarmId::from(farm),
                crop_type: "wheat".to_string(),
                image_url: format!("/uploads/{}.jpg", score),
                analysis: HealthAnalysis {
                    health_score: score,
                    status,
                    color: None,
                    metrics: HealthMetrics::default(),
                    recommendations: vec![],
                    crop_type: None,
                },
            })
            .await
            .unwrap();
    }

    let request = |uri: &str| {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token("u-1")))
            .body(Body::empty())
            .unwrap()
    };

    let (status, body) = app.send(request("/api/ml/crop-progress")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["totalSubmissions"], 2);
    assert_eq!(body["improvementScore"], "75.00");
    assert_eq!(body["currentHealth"], 70.0);
    assert_eq!(body["progress"][0]["day"], 10);
    assert_eq!(body["progress"][1]["day"], 20);
    assert_eq!(body["progress"][1]["status"], "Good");

    let (status, body) = app.send(request("/api/ml/crop-progress/north")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalSubmissions"], 1);
    assert_eq!(body["improvementScore"], "0.00");

    let (_, body) = app.send(request("/api/ml/crop-progress/empty-farm")).await;
    assert_eq!(body["totalSubmissions"], 0);
    assert_eq!(body["currentHealth"], 0.0);
}

#[tokio::test]
async fn test_progress_is_scoped_to_user() {
    let app = TestApp::new().await;
    app.state
        .crop_images
        .create(&NewCropImage {
            user_id: UserId::from("someone-else"),
            farm_id: FarmId::default(),
            crop_type: "rice".to_string(),
            image_url: "/uploads/x.jpg".to_string(),
            analysis: HealthAnalysis {
                health_score: 50.0,
                status: HealthStatus::Fair,
                color: None,
                metrics: HealthMetrics::default(),
                recommendations: vec![],
                crop_type: None,
            },
        })
        .await
        .unwrap();

    let (_, body) = app
        .send(
            Request::builder()
                .uri("/api/ml/crop-progress")
                .header(header::AUTHORIZATION, format!("Bearer {}", token("u-1")))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(body["totalSubmissions"], 0);
}

#[tokio::test]
async fn test_state_requires_jwt_secret() {
    let dir = tempfile::tempdir().unwrap();
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("s.db").display());
    let db = DatabasePool::new(&db_url).await.unwrap();
    let ml = MlClient::new(MlClientConfig::default()).unwrap();

    let config = ApiConfig {
        upload_dir: dir.path().join("uploads"),
        ..ApiConfig::default()
    };

    let result = AppState::from_parts(config, ml, db).await;
    assert!(matches!(
        result,
        Err(cbams_api::state::StateError::MissingJwtSecret)
    ));
}

#[tokio::test]
async fn test_state_creates_upload_dir() {
    let dir = tempfile::tempdir().unwrap();
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("s.db").display());
    let db = DatabasePool::new(&db_url).await.unwrap();
    let ml = MlClient::new(MlClientConfig::default()).unwrap();

    let upload_dir = dir.path().join("spool").join("images");
    let config = ApiConfig {
        upload_dir: upload_dir.clone(),
        jwt_secret: SECRET.to_string(),
        ..ApiConfig::default()
    };

    let state = AppState::from_parts(config, ml, db).await.unwrap();
    assert!(upload_dir.is_dir());
    assert_eq!(state.uploads.dir(), upload_dir.as_path());
    assert_eq!(state.ml.base_url(), "http://localhost:5001/api/ml");
    state.db.ping().await.unwrap();
}
