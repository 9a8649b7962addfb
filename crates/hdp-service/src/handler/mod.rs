//! HTTP handler for the prediction service
//!
//! - `routes`: router construction and the endpoint handlers
//! - `middleware`: request id propagation and request logging
//!
//! The response bodies are fixed by the public contract: a success body
//! with the prediction, a validation failure listing every message, and an
//! opaque internal failure.

pub mod middleware;
pub mod routes;

pub use middleware::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
pub use routes::{create_router, health_check, metrics, predict, schema, AppState};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hdp_core::{ClassProbabilities, PipelineError, PredictionResult};
use serde::{Deserialize, Serialize};

/// Fixed message returned for every internal failure
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Message returned when the body is not a JSON object
pub const NOT_AN_OBJECT_MESSAGE: &str = "Request body must be a JSON object";

/// Body of a successful prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictSuccess {
    pub success: bool,
    pub prediction: i64,
    pub probability: ClassProbabilities,
    /// RFC 3339, UTC
    pub timestamp: String,
}

impl PredictSuccess {
    pub fn new(result: PredictionResult) -> Self {
        Self {
            success: true,
            prediction: result.label,
            probability: result.probabilities,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Body of a rejected record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub success: bool,
    pub errors: Vec<String>,
}

impl ValidationFailure {
    pub fn new(errors: Vec<String>) -> Self {
        Self {
            success: false,
            errors,
        }
    }
}

/// Body of an internal failure; never carries detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalFailure {
    pub success: bool,
    pub error: String,
}

impl Default for InternalFailure {
    fn default() -> Self {
        Self {
            success: false,
            error: INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

/// The three possible answers to a prediction request
#[derive(Debug, Clone)]
pub enum PredictResponse {
    Success(PredictSuccess),
    Invalid(ValidationFailure),
    Internal(InternalFailure),
}

impl PredictResponse {
    /// Map a pipeline outcome onto the public response shapes
    pub fn from_outcome(outcome: Result<PredictionResult, PipelineError>) -> Self {
        match outcome {
            Ok(result) => PredictResponse::Success(PredictSuccess::new(result)),
            Err(PipelineError::Invalid(errors)) => PredictResponse::Invalid(
                ValidationFailure::new(errors.into_iter().map(|e| e.message).collect()),
            ),
            Err(_) => PredictResponse::Internal(InternalFailure::default()),
        }
    }

    pub fn not_an_object() -> Self {
        PredictResponse::Invalid(ValidationFailure::new(vec![
            NOT_AN_OBJECT_MESSAGE.to_string()
        ]))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PredictResponse::Success(_) => StatusCode::OK,
            PredictResponse::Invalid(_) => StatusCode::BAD_REQUEST,
            PredictResponse::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The response body as a JSON value
    pub fn body(&self) -> serde_json::Value {
        let body = match self {
            PredictResponse::Success(body) => serde_json::to_value(body),
            PredictResponse::Invalid(body) => serde_json::to_value(body),
            PredictResponse::Internal(body) => serde_json::to_value(body),
        };
        body.unwrap_or_else(|_| {
            serde_json::json!({ "success": false, "error": INTERNAL_ERROR_MESSAGE })
        })
    }
}

impl IntoResponse for PredictResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub model_features: usize,
    pub schema_fields: usize,
    pub uptime_seconds: u64,
}
