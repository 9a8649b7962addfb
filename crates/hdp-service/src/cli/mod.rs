//! Command-line interface for the prediction service
//!
//! `serve` runs the HTTP endpoint; `validate`, `predict` and `schema` run
//! the same pipeline offline against files.

pub mod commands;
pub mod output;

pub use commands::{HdpCli, HdpCommands};
pub use output::{OutputFormat, ValidationOutput};

use hdp_core::{CoreError, ModelError, SchemaError};
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::telemetry::TelemetryError;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful execution
    Success = 0,
    /// The record failed validation
    ValidationError = 1,
    /// Invalid input, arguments or files
    InvalidInput = 3,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

/// Errors surfaced by CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{0}' does not contain a JSON object")]
    NotAnObject(PathBuf),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    #[error(transparent)]
    Server(#[from] anyhow::Error),
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Schema(e) => CliError::Schema(e),
            CoreError::Model(e) => CliError::Model(e),
            CoreError::Pipeline(e) => CliError::Server(anyhow::Error::new(e)),
        }
    }
}

impl CliError {
    /// Check if the error stems from what the user supplied
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            CliError::ReadFile { .. }
                | CliError::NotAnObject(_)
                | CliError::Json(_)
                | CliError::Schema(_)
                | CliError::Model(_)
                | CliError::Config(_)
        )
    }
}

/// Run the CLI and return the exit code
pub async fn run(cli: HdpCli) -> Result<ExitCode, CliError> {
    match cli.command {
        HdpCommands::Serve {
            config,
            host,
            port,
            model,
        } => commands::execute_serve(config, host, port, model).await,
        HdpCommands::Validate {
            record,
            schema,
            format,
        } => commands::execute_validate(record, schema, format),
        HdpCommands::Predict {
            record,
            model,
            schema,
            format,
        } => commands::execute_predict(record, model, schema, format),
        HdpCommands::Schema { schema, format } => commands::execute_schema(schema, format),
    }
}
