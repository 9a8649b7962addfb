//! Routes for the prediction service
//!
//! - POST /api/predict - validate a record and run the classifier
//! - GET /health - liveness and loaded model shape
//! - GET /api/schema - the active field-rule table
//! - GET /metrics - Prometheus text exposition

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use hdp_core::{PipelineError, PredictionPipeline, Schema};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::middleware::{request_id_middleware, RequestId};
use super::{HealthResponse, PredictResponse};
use crate::config::ServerSettings;
use crate::telemetry::{Outcome, PredictionMetrics};

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PredictionPipeline>,
    pub metrics: Arc<PredictionMetrics>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(pipeline: PredictionPipeline, metrics: PredictionMetrics) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            metrics: Arc::new(metrics),
            start_time: Instant::now(),
        }
    }
}

/// Build the router with all layers applied
pub fn create_router(state: AppState, settings: &ServerSettings) -> Router {
    Router::new()
        .route("/api/predict", post(predict))
        .route("/health", get(health_check))
        .route("/api/schema", get(schema))
        .route("/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(settings.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_millis(
            settings.request_timeout_ms,
        )))
        .layer(cors_layer(&settings.cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Any origin when the list is empty, otherwise exactly the listed ones
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Prediction endpoint
///
/// The body is taken as raw bytes so that absent or mistyped fields are
/// reported by the validator rather than by a deserializer.
pub async fn predict(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    body: Bytes,
) -> PredictResponse {
    let timer = state.metrics.start_timer();
    let request_id = request_id
        .map(|Extension(id)| id.0)
        .unwrap_or_else(|| "unknown".to_string());

    let record = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(record)) => record,
        Ok(other) => {
            tracing::info!(
                request_id = %request_id,
                body_type = json_type(&other),
                "Rejected request body that is not a JSON object"
            );
            state.metrics.record_outcome(Outcome::Invalid);
            return PredictResponse::not_an_object();
        }
        Err(e) => {
            tracing::info!(request_id = %request_id, error = %e, "Rejected malformed JSON body");
            state.metrics.record_outcome(Outcome::Invalid);
            return PredictResponse::not_an_object();
        }
    };

    tracing::info!(
        request_id = %request_id,
        field_count = record.len(),
        "Received prediction request"
    );
    tracing::debug!(request_id = %request_id, payload = ?record, "Prediction payload");

    let outcome = state.pipeline.run(&record);

    match &outcome {
        Ok(result) => {
            state.metrics.record_outcome(Outcome::Success);
            state.metrics.record_prediction(result.label);
            tracing::info!(
                request_id = %request_id,
                prediction = result.label,
                positive = result.probabilities.positive,
                duration_ms = timer.elapsed_ms(),
                "Prediction successful"
            );
        }
        Err(PipelineError::Invalid(errors)) => {
            state.metrics.record_outcome(Outcome::Invalid);
            state.metrics.record_validation_errors(errors);
            tracing::info!(
                request_id = %request_id,
                error_count = errors.len(),
                "Validation failed"
            );
        }
        Err(e) => {
            state.metrics.record_outcome(Outcome::Error);
            tracing::error!(request_id = %request_id, error = %e, "Prediction failed");
        }
    }

    PredictResponse::from_outcome(outcome)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "hdp".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_features: state.pipeline.predictor().classifier().n_features(),
        schema_fields: state.pipeline.schema().len(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Active field-rule table, in field order
pub async fn schema(State(state): State<AppState>) -> Json<Schema> {
    Json(state.pipeline.schema().as_ref().clone())
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode_text() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_type_names() {
        assert_eq!(json_type(&serde_json::json!([1, 2])), "array");
        assert_eq!(json_type(&serde_json::json!("x")), "string");
        assert_eq!(json_type(&Value::Null), "null");
    }

    #[test]
    fn test_cors_layer_accepts_invalid_origin_list() {
        // Invalid entries are skipped rather than aborting startup
        let _layer = cors_layer(&["https://example.org".to_string(), "bad\norigin".to_string()]);
        let _any = cors_layer(&[]);
    }
}
