//! Heart disease prediction core
//!
//! Validation and inference pipeline behind the prediction endpoint:
//!
//! 1. **Schema** (`schema`): an ordered, declarative table of field rules.
//! 2. **Validation** (`validation`): checks an untyped JSON record against
//!    the schema and reports every violation as data.
//! 3. **Features** (`features`): builds the fixed-order numeric vector the
//!    model was trained on.
//! 4. **Model** (`model`): the classifier capability and its artifacts.
//! 5. **Prediction** (`prediction`): invokes the classifier and shapes the
//!    label and class probabilities.
//! 6. **Pipeline** (`pipeline`): the above, end to end.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hdp_core::{load_model, PredictionPipeline, Schema};
//! use std::sync::Arc;
//!
//! let schema = Arc::new(Schema::heart_disease());
//! let model = load_model("models/hdp_model.json").unwrap();
//! let pipeline = PredictionPipeline::new(schema, model).unwrap();
//!
//! let record = serde_json::json!({
//!     "age": 55, "sex": 1, "cp": 2, "trestbps": 130, "chol": 250, "fbs": 0,
//!     "restecg": 1, "thalach": 150, "exang": 0, "oldpeak": 1, "slope": 1,
//!     "ca": 0, "thal": 2
//! });
//!
//! match pipeline.run(record.as_object().unwrap()) {
//!     Ok(result) => println!("label {} p+ {}", result.label, result.probabilities.positive),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

pub mod error;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod prediction;
pub mod schema;
pub mod validation;

pub use error::{CoreError, PipelineError, Result};
pub use features::{assemble, AssembleError, FeatureVector};
pub use model::{
    load_model, Classifier, ClassifierMut, Exclusive, LogisticRegression, ModelArtifact,
    ModelError,
};
pub use pipeline::PredictionPipeline;
pub use prediction::{ClassProbabilities, PredictionResult, Predictor};
pub use schema::{CoercionPolicy, FieldRule, Range, Schema, SchemaError, SchemaFormat, ValueType};
pub use validation::{coerce, validate, ValidationError, ViolationKind};
