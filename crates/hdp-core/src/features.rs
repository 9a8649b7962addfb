//! Feature vector assembly
//!
//! Turns a validated record into the fixed-order numeric input the model
//! was trained on. Assembly trusts the validator: it is only called on
//! records that produced no [`crate::validation::ValidationError`]s.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::schema::Schema;
use crate::validation::coerce;

/// Precondition violation during assembly
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    /// The field was absent or not coercible; the record skipped validation
    #[error("field '{field}' is missing or not coercible; record was not validated")]
    Precondition { field: String },
}

/// Ordered model input, one value per schema field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl AsRef<[f64]> for FeatureVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Build the feature vector in schema declaration order
///
/// Every schema field must be present, including optional ones: the model
/// takes a fixed-width input and there is no defaulting.
pub fn assemble(record: &Map<String, Value>, schema: &Schema) -> Result<FeatureVector, AssembleError> {
    let policy = schema.coercion();

    schema
        .fields()
        .iter()
        .map(|rule| {
            record
                .get(&rule.name)
                .and_then(|raw| coerce(raw, rule.value_type, policy))
                .ok_or_else(|| AssembleError::Precondition {
                    field: rule.name.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(FeatureVector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldRule;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_assemble_follows_schema_order() {
        // Key order in the record is irrelevant
        let rec = record(json!({
            "thal": 2, "ca": 0, "slope": 1, "oldpeak": 1, "exang": 0, "thalach": 150,
            "restecg": 1, "fbs": 0, "chol": 250, "trestbps": 130, "cp": 2, "sex": 1, "age": 55
        }));

        let vector = assemble(&rec, &Schema::heart_disease()).unwrap();
        assert_eq!(
            vector.as_slice(),
            &[55.0, 1.0, 2.0, 130.0, 250.0, 0.0, 1.0, 150.0, 0.0, 1.0, 1.0, 0.0, 2.0]
        );
        assert_eq!(vector.len(), Schema::heart_disease().len());
    }

    #[test]
    fn test_assemble_applies_coercion() {
        let schema = Schema::new(vec![
            FieldRule::integer("oldpeak"),
            FieldRule::integer("sex"),
            FieldRule::integer("age"),
        ])
        .unwrap();

        let rec = record(json!({"oldpeak": 2.7, "sex": true, "age": "61"}));
        let vector = assemble(&rec, &schema).unwrap();
        assert_eq!(vector.into_inner(), vec![2.0, 1.0, 61.0]);
    }

    #[test]
    fn test_assemble_rejects_unvalidated_record() {
        let rec = record(json!({"age": 55}));
        let err = assemble(&rec, &Schema::heart_disease()).unwrap_err();
        assert_eq!(
            err,
            AssembleError::Precondition {
                field: "sex".to_string()
            }
        );
    }

    #[test]
    fn test_absent_optional_field_fails_assembly() {
        let schema = Schema::new(vec![
            FieldRule::integer("age"),
            FieldRule::integer("ca").optional(),
        ])
        .unwrap();

        let rec = record(json!({"age": 40}));
        assert!(assemble(&rec, &schema).is_err());
    }

    #[test]
    fn test_vector_serializes_as_array() {
        let rec = record(json!({"age": 40}));
        let schema = Schema::new(vec![FieldRule::integer("age")]).unwrap();
        let vector = assemble(&rec, &schema).unwrap();
        assert_eq!(serde_json::to_value(&vector).unwrap(), json!([40.0]));
    }
}
