//! Record validation against a [`Schema`]
//!
//! Validation never fails: every rule violation is reported as a
//! [`ValidationError`] and the caller decides what to do with them. All
//! fields are checked; one bad field does not hide problems in another.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

use crate::schema::{CoercionPolicy, FieldRule, Schema, ValueType};

/// The constraint a field violated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Missing,
    WrongType,
    BelowMin,
    AboveMax,
    NotAllowed,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Missing => write!(f, "missing"),
            ViolationKind::WrongType => write!(f, "wrong_type"),
            ViolationKind::BelowMin => write!(f, "below_min"),
            ViolationKind::AboveMax => write!(f, "above_max"),
            ViolationKind::NotAllowed => write!(f, "not_allowed"),
        }
    }
}

/// One violated constraint on one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub kind: ViolationKind,
    /// User-facing message
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
        }
    }

    fn missing(rule: &FieldRule) -> Self {
        Self::new(
            &rule.name,
            ViolationKind::Missing,
            format!("Missing required field: {}", rule.name),
        )
    }

    fn wrong_type(rule: &FieldRule) -> Self {
        Self::new(
            &rule.name,
            ViolationKind::WrongType,
            format!("{} must be of type {}", rule.name, rule.value_type),
        )
    }

    fn below_min(rule: &FieldRule, min: f64) -> Self {
        Self::new(
            &rule.name,
            ViolationKind::BelowMin,
            format!("{} must be at least {}", rule.name, min),
        )
    }

    fn above_max(rule: &FieldRule, max: f64) -> Self {
        Self::new(
            &rule.name,
            ViolationKind::AboveMax,
            format!("{} must be no more than {}", rule.name, max),
        )
    }

    fn not_allowed(rule: &FieldRule) -> Self {
        Self::new(
            &rule.name,
            ViolationKind::NotAllowed,
            format!("{} must be one of {}", rule.name, rule.allowed_values_display()),
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Check a record against every rule in the schema
///
/// Returns an empty vector when the record is valid. Errors are ordered by
/// schema declaration order, then by check order within a field (type,
/// min, max, allowed set). Keys the schema does not mention are ignored.
pub fn validate(record: &Map<String, Value>, schema: &Schema) -> Vec<ValidationError> {
    let policy = schema.coercion();
    let mut errors = Vec::new();

    for rule in schema.fields() {
        let Some(raw) = record.get(&rule.name) else {
            if rule.required {
                errors.push(ValidationError::missing(rule));
            }
            continue;
        };

        // Range and allowed-set checks only make sense on a coerced value
        let Some(value) = coerce(raw, rule.value_type, policy) else {
            errors.push(ValidationError::wrong_type(rule));
            continue;
        };

        if let Some(range) = &rule.range {
            if value < range.min {
                errors.push(ValidationError::below_min(rule, range.min));
            }
            if value > range.max {
                errors.push(ValidationError::above_max(rule, range.max));
            }
        }

        if !rule.allows(value) {
            errors.push(ValidationError::not_allowed(rule));
        }
    }

    errors
}

/// Convert a raw JSON value to the declared type
///
/// Returns `None` when the value is not representable as that type under
/// the given policy. Integer results are whole numbers within `i64` range.
pub fn coerce(value: &Value, value_type: ValueType, policy: CoercionPolicy) -> Option<f64> {
    match (policy, value) {
        (_, Value::Number(n)) => coerce_number(n, value_type, policy),
        (CoercionPolicy::Lenient, Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        (CoercionPolicy::Lenient, Value::String(s)) => parse_numeric_str(s.trim(), value_type),
        _ => None,
    }
}

fn coerce_number(n: &Number, value_type: ValueType, policy: CoercionPolicy) -> Option<f64> {
    if let Some(i) = n.as_i64() {
        return Some(i as f64);
    }

    match value_type {
        ValueType::Float => n.as_f64().filter(|f| f.is_finite()),
        ValueType::Integer => {
            // u64 above i64::MAX
            if n.is_u64() {
                return None;
            }
            let f = n.as_f64().filter(|f| f.is_finite())?;
            if policy == CoercionPolicy::Strict && f.fract() != 0.0 {
                return None;
            }
            integral_in_range(f.trunc())
        }
    }
}

fn parse_numeric_str(s: &str, value_type: ValueType) -> Option<f64> {
    match value_type {
        ValueType::Integer => s.parse::<i64>().ok().map(|i| i as f64),
        ValueType::Float => s.parse::<f64>().ok().filter(|f| f.is_finite()),
    }
}

fn integral_in_range(f: f64) -> Option<f64> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f)
    } else {
        None
    }
}
