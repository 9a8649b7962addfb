//! Output formatting for the `hdp` command line
//!
//! Text output is colored for terminals; JSON output is stable for scripts.

use clap::ValueEnum;
use colored::Colorize;
use hdp_core::{Schema, ValidationError};
use serde::{Deserialize, Serialize};
use std::io::Write;

use super::CliError;
use crate::handler::PredictResponse;

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable, colored
    #[default]
    Text,
    /// JSON for machine processing
    Json,
}

/// Result of validating one record offline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutput {
    pub valid: bool,
    pub error_count: usize,
    pub errors: Vec<ViolationOutput>,
    pub summary: String,
}

/// One rule violation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationOutput {
    pub field: String,
    pub kind: String,
    pub message: String,
}

impl ValidationOutput {
    pub fn from_errors(errors: &[ValidationError]) -> Self {
        let summary = if errors.is_empty() {
            "Record is valid".to_string()
        } else {
            format!("Record has {} error(s)", errors.len())
        };

        Self {
            valid: errors.is_empty(),
            error_count: errors.len(),
            errors: errors
                .iter()
                .map(|e| ViolationOutput {
                    field: e.field.clone(),
                    kind: e.kind.to_string(),
                    message: e.message.clone(),
                })
                .collect(),
            summary,
        }
    }

    pub fn render(&self, format: OutputFormat, out: &mut impl Write) -> Result<(), CliError> {
        match format {
            OutputFormat::Json => write_json(self, out),
            OutputFormat::Text => self.render_text(out),
        }
    }

    fn render_text(&self, out: &mut impl Write) -> Result<(), CliError> {
        let icon = if self.valid { "+".green() } else { "x".red() };
        writeln!(out, "{} {}", icon, self.summary)?;

        for error in &self.errors {
            writeln!(
                out,
                "  {} [{}] {}",
                "x".red(),
                error.kind.dimmed(),
                error.message
            )?;
        }

        out.flush()?;
        Ok(())
    }
}

/// Render a prediction response
///
/// JSON output is the exact body the HTTP endpoint returns.
pub fn render_prediction(
    response: &PredictResponse,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if format == OutputFormat::Json {
        return write_json(&response.body(), out);
    }

    match response {
        PredictResponse::Success(success) => {
            let label = if success.prediction == 1 {
                "positive".red().bold()
            } else {
                "negative".green().bold()
            };
            writeln!(out, "{} Prediction: {} ({})", "+".green(), success.prediction, label)?;
            writeln!(
                out,
                "  {} {:.4}",
                "P(negative):".dimmed(),
                success.probability.negative
            )?;
            writeln!(
                out,
                "  {} {:.4}",
                "P(positive):".dimmed(),
                success.probability.positive
            )?;
        }
        PredictResponse::Invalid(failure) => {
            writeln!(out, "{} Record rejected", "x".red())?;
            for message in &failure.errors {
                writeln!(out, "  {} {}", "x".red(), message)?;
            }
        }
        PredictResponse::Internal(failure) => {
            writeln!(out, "{} {}", "x".red().bold(), failure.error)?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Render the active field-rule table
pub fn render_schema(schema: &Schema, format: OutputFormat, out: &mut impl Write) -> Result<(), CliError> {
    if format == OutputFormat::Json {
        return write_json(schema, out);
    }

    writeln!(out, "{}", "Field rules".cyan().bold())?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "coercion: {:?}", schema.coercion())?;

    for (index, rule) in schema.fields().iter().enumerate() {
        let required = if rule.required { "required" } else { "optional" };
        write!(
            out,
            "{:>2}. {:<10} {:<6} {}",
            index + 1,
            rule.name.bold(),
            rule.value_type.type_name(),
            required.dimmed()
        )?;
        if let Some(range) = &rule.range {
            write!(out, "  range [{}, {}]", range.min, range.max)?;
        }
        if rule.allowed_values.is_some() {
            write!(out, "  one of {}", rule.allowed_values_display())?;
        }
        writeln!(out)?;
    }

    out.flush()?;
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(value: &T, out: &mut impl Write) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    writeln!(out, "{}", json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdp_core::ViolationKind;

    fn render_to_string(output: &ValidationOutput, format: OutputFormat) -> String {
        let mut buffer = Vec::new();
        output.render(format, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_validation_output_summary() {
        let valid = ValidationOutput::from_errors(&[]);
        assert!(valid.valid);
        assert_eq!(valid.summary, "Record is valid");

        let invalid = ValidationOutput::from_errors(&[ValidationError::new(
            "trestbps",
            ViolationKind::AboveMax,
            "trestbps must be no more than 200",
        )]);
        assert!(!invalid.valid);
        assert_eq!(invalid.error_count, 1);
        assert_eq!(invalid.errors[0].kind, "above_max");
    }

    #[test]
    fn test_json_rendering_is_parseable() {
        let output = ValidationOutput::from_errors(&[ValidationError::new(
            "age",
            ViolationKind::Missing,
            "Missing required field: age",
        )]);
        let text = render_to_string(&output, OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["valid"], false);
        assert_eq!(parsed["errors"][0]["message"], "Missing required field: age");
    }

    #[test]
    fn test_text_rendering_lists_messages() {
        let output = ValidationOutput::from_errors(&[ValidationError::new(
            "sex",
            ViolationKind::NotAllowed,
            "sex must be one of [0, 1]",
        )]);
        let text = render_to_string(&output, OutputFormat::Text);
        assert!(text.contains("Record has 1 error(s)"));
        assert!(text.contains("sex must be one of [0, 1]"));
    }

    #[test]
    fn test_schema_text_lists_every_field() {
        let schema = Schema::heart_disease();
        let mut buffer = Vec::new();
        render_schema(&schema, OutputFormat::Text, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        for name in schema.field_names() {
            assert!(text.contains(name), "{name} missing from output");
        }
    }
}
