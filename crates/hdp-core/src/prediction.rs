//! Predictor adapter
//!
//! Calls the classifier for one feature vector and shapes the raw output
//! into a [`PredictionResult`]. Class 0 is always reported as `negative`
//! and class 1 as `positive`, whatever label the model returned.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::features::FeatureVector;
use crate::model::{Classifier, ModelError};

/// Tolerance when checking that probabilities sum to one
const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Binary class distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub negative: f64,
    pub positive: f64,
}

/// Outcome of one successful prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: i64,
    pub probabilities: ClassProbabilities,
}

/// Adapter over a shared classifier
#[derive(Clone)]
pub struct Predictor {
    classifier: Arc<dyn Classifier>,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("n_features", &self.classifier.n_features())
            .finish()
    }
}

impl Predictor {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.classifier
    }

    /// Run the classifier once and package its output
    ///
    /// No retries and no fallback: any classifier error or malformed output
    /// is returned as is.
    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult, ModelError> {
        let expected = self.classifier.n_features();
        if features.len() != expected {
            return Err(ModelError::ShapeMismatch {
                expected,
                actual: features.len(),
            });
        }

        let label = self.classifier.predict_label(features.as_slice())?;
        let distribution = self.classifier.predict_probabilities(features.as_slice())?;

        let probabilities = match distribution.as_slice() {
            [negative, positive] => ClassProbabilities {
                negative: *negative,
                positive: *positive,
            },
            other => {
                return Err(ModelError::UnexpectedOutput(format!(
                    "expected 2 class probabilities, got {}",
                    other.len()
                )))
            }
        };

        check_distribution(&probabilities)?;

        if !matches!(label, 0 | 1) {
            return Err(ModelError::UnexpectedOutput(format!(
                "label {label} is not a binary class id"
            )));
        }

        Ok(PredictionResult {
            label,
            probabilities,
        })
    }
}

fn check_distribution(probs: &ClassProbabilities) -> Result<(), ModelError> {
    let in_unit = |p: f64| p.is_finite() && (0.0..=1.0).contains(&p);
    if !in_unit(probs.negative) || !in_unit(probs.positive) {
        return Err(ModelError::UnexpectedOutput(format!(
            "probabilities out of range: {probs:?}"
        )));
    }

    let total = probs.negative + probs.positive;
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(ModelError::UnexpectedOutput(format!(
            "probabilities sum to {total}"
        )));
    }

    Ok(())
}
