//! Binary logistic regression
//!
//! Artifact layout matches what scikit-learn exposes on a fitted
//! `LogisticRegression`: `coef_[0]`, `intercept_[0]` and `classes_`.

use serde::{Deserialize, Serialize};

use super::{Classifier, ModelError};

fn default_classes() -> [i64; 2] {
    [0, 1]
}

/// Linear model with a sigmoid link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Training column names; empty when the exporter did not record them
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Class labels; only `[0, 1]` is accepted, index 1 is the positive class
    #[serde(default = "default_classes")]
    pub classes: [i64; 2],
}

impl LogisticRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self, ModelError> {
        let model = Self {
            feature_names: Vec::new(),
            coefficients,
            intercept,
            classes: default_classes(),
        };
        model.check()?;
        Ok(model)
    }

    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self, ModelError> {
        self.feature_names = names;
        self.check()?;
        Ok(self)
    }

    pub(crate) fn check(&self) -> Result<(), ModelError> {
        if self.coefficients.is_empty() {
            return Err(ModelError::InvalidArtifact(
                "model has no coefficients".to_string(),
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::InvalidArtifact(
                "model parameters must be finite".to_string(),
            ));
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != self.coefficients.len() {
            return Err(ModelError::InvalidArtifact(format!(
                "{} feature names for {} coefficients",
                self.feature_names.len(),
                self.coefficients.len()
            )));
        }
        if self.classes != default_classes() {
            return Err(ModelError::InvalidArtifact(format!(
                "class labels must be [0, 1] (negative, positive), got {:?}",
                self.classes
            )));
        }
        Ok(())
    }

    /// Signed distance to the decision boundary
    pub fn decision_function(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }

        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum();

        Ok(dot + self.intercept)
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        if self.feature_names.is_empty() {
            None
        } else {
            Some(&self.feature_names)
        }
    }

    fn predict_label(&self, features: &[f64]) -> Result<i64, ModelError> {
        // Ties go to the first class, as with argmax over probabilities
        let z = self.decision_function(features)?;
        Ok(if z > 0.0 {
            self.classes[1]
        } else {
            self.classes[0]
        })
    }

    fn predict_probabilities(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        let positive = sigmoid(self.decision_function(features)?);
        Ok(vec![1.0 - positive, positive])
    }
}
