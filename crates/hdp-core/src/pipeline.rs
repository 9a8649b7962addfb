//! Validate, assemble, predict
//!
//! [`PredictionPipeline`] is built once at startup from the schema and the
//! loaded classifier, then shared by every request. It holds no mutable
//! state of its own.

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::PipelineError;
use crate::features::assemble;
use crate::model::{Classifier, ModelError};
use crate::prediction::{PredictionResult, Predictor};
use crate::schema::Schema;
use crate::validation::validate;

/// The request-scoped inference pipeline
#[derive(Debug, Clone)]
pub struct PredictionPipeline {
    schema: Arc<Schema>,
    predictor: Predictor,
}

impl PredictionPipeline {
    /// Pair a schema with a classifier
    ///
    /// Fails when the model was trained on a different number of features,
    /// or on differently named features when the artifact records names.
    pub fn new(schema: Arc<Schema>, classifier: Arc<dyn Classifier>) -> Result<Self, ModelError> {
        if classifier.n_features() != schema.len() {
            return Err(ModelError::ShapeMismatch {
                expected: schema.len(),
                actual: classifier.n_features(),
            });
        }

        if let Some(names) = classifier.feature_names() {
            let mismatch = schema
                .field_names()
                .zip(names)
                .find(|(field, name)| *field != name.as_str());
            if let Some((field, name)) = mismatch {
                return Err(ModelError::InvalidArtifact(format!(
                    "model feature '{name}' does not match schema field '{field}'"
                )));
            }
        }

        Ok(Self {
            schema,
            predictor: Predictor::new(classifier),
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    /// Run one record through the pipeline
    ///
    /// Validation errors short-circuit before the model is touched.
    pub fn run(&self, record: &Map<String, Value>) -> Result<PredictionResult, PipelineError> {
        let errors = validate(record, &self.schema);
        if !errors.is_empty() {
            tracing::debug!(error_count = errors.len(), "Record failed validation");
            return Err(PipelineError::Invalid(errors));
        }

        let features = assemble(record, &self.schema)?;
        let result = self.predictor.predict(&features)?;

        tracing::debug!(
            label = result.label,
            positive = result.probabilities.positive,
            "Prediction complete"
        );

        Ok(result)
    }
}
