//! Prometheus metrics for the prediction endpoint
//!
//! - `hdp_requests_total` (counter) - prediction requests by outcome
//! - `hdp_validation_errors_total` (counter) - rule violations by field and kind
//! - `hdp_predictions_total` (counter) - successful predictions by label
//! - `hdp_request_duration_seconds` (histogram) - end-to-end handler latency
//! - `hdp_active_requests` (gauge) - requests currently in the pipeline

use hdp_core::ValidationError;
use prometheus::{CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry};
use std::time::Instant;

use super::{Result, TelemetryError};

const NAMESPACE: &str = "hdp";

/// Result of a prediction request, used as a metric label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Invalid,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Invalid => "invalid",
            Outcome::Error => "error",
        }
    }
}

/// Metric handles plus the registry they are registered in
pub struct PredictionMetrics {
    registry: Registry,
    requests_total: CounterVec,
    validation_errors_total: CounterVec,
    predictions_total: CounterVec,
    duration_seconds: Histogram,
    active_requests: Gauge,
}

impl PredictionMetrics {
    /// Create metrics in a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("requests_total", "Total number of prediction requests").namespace(NAMESPACE),
            &["outcome"],
        )?;

        let validation_errors_total = CounterVec::new(
            Opts::new(
                "validation_errors_total",
                "Total number of field rule violations",
            )
            .namespace(NAMESPACE),
            &["field", "kind"],
        )?;

        let predictions_total = CounterVec::new(
            Opts::new("predictions_total", "Total number of predictions by label")
                .namespace(NAMESPACE),
            &["label"],
        )?;

        let duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "request_duration_seconds",
                "Prediction request duration in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25]),
        )?;

        let active_requests = Gauge::with_opts(
            Opts::new("active_requests", "Prediction requests in progress").namespace(NAMESPACE),
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(validation_errors_total.clone()))?;
        registry.register(Box::new(predictions_total.clone()))?;
        registry.register(Box::new(duration_seconds.clone()))?;
        registry.register(Box::new(active_requests.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            validation_errors_total,
            predictions_total,
            duration_seconds,
            active_requests,
        })
    }

    pub fn record_outcome(&self, outcome: Outcome) {
        self.requests_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    pub fn record_validation_errors(&self, errors: &[ValidationError]) {
        for error in errors {
            let kind = error.kind.to_string();
            self.validation_errors_total
                .with_label_values(&[error.field.as_str(), kind.as_str()])
                .inc();
        }
    }

    pub fn record_prediction(&self, label: i64) {
        let label = label.to_string();
        self.predictions_total
            .with_label_values(&[label.as_str()])
            .inc();
    }

    /// Start timing a request; the duration is recorded when the guard drops
    pub fn start_timer(&self) -> RequestTimer<'_> {
        self.active_requests.inc();
        RequestTimer {
            start: Instant::now(),
            metrics: self,
        }
    }

    /// Encode all metrics in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Encoding(e.to_string()))
    }
}

/// RAII guard for timing requests
pub struct RequestTimer<'a> {
    start: Instant,
    metrics: &'a PredictionMetrics,
}

impl RequestTimer<'_> {
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for RequestTimer<'_> {
    fn drop(&mut self) {
        self.metrics
            .duration_seconds
            .observe(self.start.elapsed().as_secs_f64());
        self.metrics.active_requests.dec();
    }
}
