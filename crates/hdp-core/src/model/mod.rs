//! Classifier capability consumed by the predictor
//!
//! The pipeline only sees the [`Classifier`] trait. Concrete models are
//! loaded once at startup from a JSON artifact and shared behind an `Arc`.
//!
//! Models that cannot be called concurrently implement [`ClassifierMut`]
//! instead and are wrapped in [`Exclusive`], which serializes calls.

pub mod logistic;

pub use logistic::LogisticRegression;

use serde::Deserialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors raised by model loading or invocation
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Feature vector has {actual} values, model expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Model returned unexpected output: {0}")]
    UnexpectedOutput(String),

    #[error("Model lock poisoned by a previous panic")]
    Poisoned,
}

/// A trained binary classifier that is safe to call concurrently
pub trait Classifier: Send + Sync {
    /// Width of the input the model was trained on
    fn n_features(&self) -> usize;

    /// Feature names in training order, when the artifact records them
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    fn predict_label(&self, features: &[f64]) -> Result<i64, ModelError>;

    /// Per-class probabilities, indexed by class position
    fn predict_probabilities(&self, features: &[f64]) -> Result<Vec<f64>, ModelError>;
}

/// A classifier that needs exclusive access for each call
pub trait ClassifierMut: Send {
    fn n_features(&self) -> usize;

    fn predict_label(&mut self, features: &[f64]) -> Result<i64, ModelError>;

    fn predict_probabilities(&mut self, features: &[f64]) -> Result<Vec<f64>, ModelError>;
}

/// Serializes calls to a non-reentrant model
pub struct Exclusive<M> {
    inner: Mutex<M>,
    n_features: usize,
}

impl<M: ClassifierMut> Exclusive<M> {
    pub fn new(model: M) -> Self {
        let n_features = model.n_features();
        Self {
            inner: Mutex::new(model),
            n_features,
        }
    }

    fn with_model<T>(
        &self,
        f: impl FnOnce(&mut M) -> Result<T, ModelError>,
    ) -> Result<T, ModelError> {
        let mut guard = self.inner.lock().map_err(|_| ModelError::Poisoned)?;
        f(&mut *guard)
    }
}

impl<M: ClassifierMut> Classifier for Exclusive<M> {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_label(&self, features: &[f64]) -> Result<i64, ModelError> {
        self.with_model(|m| m.predict_label(features))
    }

    fn predict_probabilities(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.with_model(|m| m.predict_probabilities(features))
    }
}

/// Supported artifact kinds, tagged by `kind`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LogisticRegression(LogisticRegression),
}

impl ModelArtifact {
    /// Check the artifact and turn it into a shareable classifier
    pub fn into_classifier(self) -> Result<Arc<dyn Classifier>, ModelError> {
        match self {
            ModelArtifact::LogisticRegression(model) => {
                model.check()?;
                Ok(Arc::new(model))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::LogisticRegression(_) => "logistic_regression",
        }
    }
}

/// Load a model artifact from disk
pub fn load_model(path: impl AsRef<Path>) -> Result<Arc<dyn Classifier>, ModelError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let artifact: ModelArtifact = serde_json::from_str(&content)?;
    let kind = artifact.kind();
    let classifier = artifact.into_classifier()?;

    tracing::info!(
        path = %path.display(),
        kind = kind,
        n_features = classifier.n_features(),
        "Model loaded successfully"
    );

    Ok(classifier)
}
