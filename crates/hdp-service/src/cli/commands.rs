//! CLI command definitions and their execution

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::io;
use std::path::{Path, PathBuf};

use super::output::{render_prediction, render_schema, OutputFormat, ValidationOutput};
use super::{CliError, ExitCode};
use crate::config::ServiceConfig;
use crate::handler::PredictResponse;

/// Heart disease prediction service
#[derive(Parser, Debug)]
#[command(name = "hdp")]
#[command(about = "Heart disease prediction service - validate records and serve predictions", long_about = None)]
#[command(version)]
pub struct HdpCli {
    #[command(subcommand)]
    pub command: HdpCommands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum HdpCommands {
    /// Start the HTTP server
    Serve {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to, overriding the configuration file
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, overriding the configuration file
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Model artifact, overriding the configuration file
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Validate a JSON record without running the model
    Validate {
        /// Path to the JSON record
        #[arg(short, long)]
        record: PathBuf,

        /// Field-rule table (JSON, YAML or TOML); built-in table when omitted
        #[arg(short, long)]
        schema: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Run the full pipeline on a JSON record
    Predict {
        /// Path to the JSON record
        #[arg(short, long)]
        record: PathBuf,

        /// Model artifact
        #[arg(short, long)]
        model: PathBuf,

        /// Field-rule table; built-in table when omitted
        #[arg(short, long)]
        schema: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the active field-rule table
    Schema {
        /// Field-rule table; built-in table when omitted
        #[arg(short, long)]
        schema: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Load configuration, apply flag overrides and serve until shutdown
pub async fn execute_serve(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    model: Option<PathBuf>,
) -> Result<ExitCode, CliError> {
    let mut settings = ServiceConfig::load(config.as_deref())?;
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }
    if let Some(model) = model {
        settings.model.path = model;
    }
    settings.validate()?;

    crate::telemetry::init_tracing(&settings.logging)?;
    crate::serve(settings).await?;
    Ok(ExitCode::Success)
}

/// Validate one record offline
pub fn execute_validate(
    record: PathBuf,
    schema: Option<PathBuf>,
    format: OutputFormat,
) -> Result<ExitCode, CliError> {
    let schema = crate::load_schema(schema.as_deref())?;
    let record = read_record(&record)?;

    let errors = hdp_core::validate(&record, &schema);
    ValidationOutput::from_errors(&errors).render(format, &mut io::stdout().lock())?;

    Ok(if errors.is_empty() {
        ExitCode::Success
    } else {
        ExitCode::ValidationError
    })
}

/// Validate and predict one record offline
pub fn execute_predict(
    record: PathBuf,
    model: PathBuf,
    schema: Option<PathBuf>,
    format: OutputFormat,
) -> Result<ExitCode, CliError> {
    let pipeline = crate::load_pipeline(schema.as_deref(), &model)?;
    let record = read_record(&record)?;

    let outcome = pipeline.run(&record);
    if let Err(e) = &outcome {
        if !e.is_user_error() {
            tracing::error!(error = %e, "Prediction failed");
        }
    }

    let response = PredictResponse::from_outcome(outcome);
    render_prediction(&response, format, &mut io::stdout().lock())?;

    Ok(match response {
        PredictResponse::Success(_) => ExitCode::Success,
        PredictResponse::Invalid(_) => ExitCode::ValidationError,
        PredictResponse::Internal(_) => ExitCode::InternalError,
    })
}

/// Print the active field-rule table
pub fn execute_schema(schema: Option<PathBuf>, format: OutputFormat) -> Result<ExitCode, CliError> {
    let schema = crate::load_schema(schema.as_deref())?;
    render_schema(&schema, format, &mut io::stdout().lock())?;
    Ok(ExitCode::Success)
}

/// Read a file holding a single JSON object
pub fn read_record(path: &Path) -> Result<Map<String, Value>, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    match serde_json::from_str(&content)? {
        Value::Object(record) => Ok(record),
        _ => Err(CliError::NotAnObject(path.to_path_buf())),
    }
}
