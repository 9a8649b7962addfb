//! Router tests driven through `tower::ServiceExt::oneshot`

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use hdp_core::{
    Classifier, FieldRule, ModelArtifact, ModelError, PredictionPipeline, Schema,
};
use hdp_service::config::ServerSettings;
use hdp_service::{create_router, AppState, PredictionMetrics};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const MODEL: &str = include_str!("../../../models/hdp_model.json");

fn valid_record() -> Value {
    json!({
        "age": 55, "sex": 1, "cp": 2, "trestbps": 130, "chol": 250, "fbs": 0,
        "restecg": 1, "thalach": 150, "exang": 0, "oldpeak": 1, "slope": 1,
        "ca": 0, "thal": 2
    })
}

fn app_with(pipeline: PredictionPipeline) -> Router {
    let state = AppState::new(pipeline, PredictionMetrics::new().unwrap());
    create_router(state, &ServerSettings::default())
}

fn app() -> Router {
    let artifact: ModelArtifact = serde_json::from_str(MODEL).unwrap();
    let pipeline = PredictionPipeline::new(
        Arc::new(Schema::heart_disease()),
        artifact.into_classifier().unwrap(),
    )
    .unwrap();
    app_with(pipeline)
}

/// Classifier whose every call fails
struct BrokenClassifier;

impl Classifier for BrokenClassifier {
    fn n_features(&self) -> usize {
        1
    }

    fn predict_label(&self, _features: &[f64]) -> Result<i64, ModelError> {
        Err(ModelError::UnexpectedOutput("weights corrupted".into()))
    }

    fn predict_probabilities(&self, _features: &[f64]) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::UnexpectedOutput("weights corrupted".into()))
    }
}

fn predict_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_predict_success() {
    let (status, body) = send(app(), predict_request(valid_record().to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let prediction = body["prediction"].as_i64().unwrap();
    assert!(prediction == 0 || prediction == 1);

    let negative = body["probability"]["negative"].as_f64().unwrap();
    let positive = body["probability"]["positive"].as_f64().unwrap();
    assert!((negative + positive - 1.0).abs() < 1e-9);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_predict_validation_failure() {
    let mut record = valid_record();
    let object = record.as_object_mut().unwrap();
    object.remove("age");
    object.insert("sex".into(), json!(5));

    let (status, body) = send(app(), predict_request(record.to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let errors: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e.as_str().unwrap())
        .collect();
    assert_eq!(
        errors,
        vec!["Missing required field: age", "sex must be one of [0, 1]"]
    );
}

#[tokio::test]
async fn test_predict_above_max() {
    let mut record = valid_record();
    record["trestbps"] = json!(300);

    let (status, body) = send(app(), predict_request(record.to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["trestbps must be no more than 200"]));
}

#[tokio::test]
async fn test_predict_non_object_body() {
    for payload in ["[1, 2, 3]", "42", "null", "{not json"] {
        let (status, body) = send(app(), predict_request(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        assert_eq!(
            body,
            json!({"success": false, "errors": ["Request body must be a JSON object"]})
        );
    }
}

#[tokio::test]
async fn test_predict_model_failure_is_opaque() {
    let schema = Arc::new(Schema::new(vec![FieldRule::integer("age").with_range(18.0, 100.0)]).unwrap());
    let pipeline = PredictionPipeline::new(schema, Arc::new(BrokenClassifier)).unwrap();

    let (status, body) = send(app_with(pipeline), predict_request(r#"{"age": 40}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"success": false, "error": "Internal server error"})
    );
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/predict")
        .header("x-request-id", "req-42")
        .body(Body::from(valid_record().to_string()))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let padding = "x".repeat(ServerSettings::default().max_body_bytes + 1);
    let body = json!({ "padding": padding }).to_string();

    let response = app().oneshot(predict_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_features"], 13);
    assert_eq!(body["schema_fields"], 13);
}

#[tokio::test]
async fn test_schema_preserves_field_order() {
    let request = Request::builder()
        .uri("/api/schema")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang",
            "oldpeak", "slope", "ca", "thal"
        ]
    );
}

#[tokio::test]
async fn test_metrics_reflect_requests() {
    let app = app();

    let (status, _) = send(app.clone(), predict_request(valid_record().to_string())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(app.clone(), predict_request(r#"{"age": 5}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("hdp_requests_total{outcome=\"success\"} 1"));
    assert!(text.contains("hdp_requests_total{outcome=\"invalid\"} 1"));
    assert!(text.contains("hdp_validation_errors_total{field=\"age\",kind=\"below_min\"} 1"));
    assert!(text.contains("hdp_request_duration_seconds_count 2"));
    assert!(text.contains("hdp_active_requests 0"));
}
