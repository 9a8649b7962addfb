//! Error types for the prediction core
//!
//! Validation failures are not errors in this sense: they are returned as
//! data by [`crate::validation::validate`]. The types here cover schema
//! misconfiguration, precondition violations and model failures.

use thiserror::Error;

use crate::features::AssembleError;
use crate::model::ModelError;
use crate::schema::SchemaError;
use crate::validation::ValidationError;

/// Failure of a single pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The record violated one or more field rules
    #[error("Validation failed with {} error(s)", .0.len())]
    Invalid(Vec<ValidationError>),

    /// Feature assembly hit a record the validator should have rejected
    #[error("Feature assembly failed: {0}")]
    Assemble(#[from] AssembleError),

    /// The classifier failed or returned unusable output
    #[error("Model invocation failed: {0}")]
    Model(#[from] ModelError),
}

impl PipelineError {
    /// Check if this is a user-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        matches!(self, PipelineError::Invalid(_))
    }

    /// Validation messages, empty for internal failures
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            PipelineError::Invalid(errors) => errors,
            _ => &[],
        }
    }
}

/// Crate-level error for startup and loading paths
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
