//! Heart disease prediction service
//!
//! HTTP boundary and command line around [`hdp_core`]:
//!
//! - **Config** (`config`): TOML settings for the listener, model, schema and logs
//! - **Telemetry** (`telemetry`): tracing subscriber setup and Prometheus metrics
//! - **Handler** (`handler`): axum router for `/api/predict`, `/health`,
//!   `/api/schema` and `/metrics`
//! - **CLI** (`cli`): the `hdp` binary
//!
//! ## CLI Usage
//!
//! ```bash
//! # Serve on the default port 5000
//! hdp serve --config hdp.toml
//!
//! # Check a record offline
//! hdp validate --record patient.json
//!
//! # Predict offline, printing the HTTP response body
//! hdp predict --record patient.json --model models/hdp_model.json --format json
//! ```

pub mod cli;
pub mod config;
pub mod handler;
pub mod telemetry;

pub use cli::{CliError, ExitCode, HdpCli, HdpCommands};
pub use config::{ConfigError, ServiceConfig};
pub use handler::{create_router, AppState};
pub use telemetry::{init_tracing, PredictionMetrics};

use anyhow::Context;
use hdp_core::{load_model, PredictionPipeline, Schema, SchemaError};
use std::path::Path;
use std::sync::Arc;

/// The configured field-rule table, or the built-in one
pub fn load_schema(path: Option<&Path>) -> Result<Schema, SchemaError> {
    match path {
        Some(path) => Schema::from_path(path),
        None => Ok(Schema::heart_disease()),
    }
}

/// Load the schema and model and pair them
pub fn load_pipeline(schema: Option<&Path>, model: &Path) -> hdp_core::Result<PredictionPipeline> {
    let schema = Arc::new(load_schema(schema)?);
    let classifier = load_model(model)?;
    Ok(PredictionPipeline::new(schema, classifier)?)
}

/// Serve the prediction endpoint until Ctrl-C or SIGTERM
///
/// A schema or model that fails to load aborts startup.
pub async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let pipeline = load_pipeline(config.schema.path.as_deref(), &config.model.path)
        .with_context(|| format!("failed to load model {}", config.model.path.display()))?;
    let metrics = PredictionMetrics::new().context("failed to register metrics")?;

    tracing::info!(
        schema_fields = pipeline.schema().len(),
        model = %config.model.path.display(),
        "Prediction pipeline ready"
    );

    let router = create_router(AppState::new(pipeline, metrics), &config.server);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        address = %addr,
        version = env!("CARGO_PKG_VERSION"),
        "Starting heart disease prediction service"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Run the CLI, mapping failures to exit codes
pub async fn run_cli(cli: HdpCli) -> ExitCode {
    match cli::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if e.is_user_error() {
                ExitCode::InvalidInput
            } else {
                ExitCode::InternalError
            }
        }
    }
}
