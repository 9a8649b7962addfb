//! Declarative field-rule schema
//!
//! The schema is an ordered table of [`FieldRule`]s. It is data, not code:
//! adding a field or tightening a bound means editing the table (or the
//! schema file it was loaded from), never the validator.
//!
//! Declaration order is significant for feature assembly only. The
//! validator visits fields in the same order so that error messages come
//! out in a stable sequence.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Expected scalar type of a field after coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[serde(rename = "int", alias = "integer")]
    Integer,
    Float,
}

impl ValueType {
    /// Name used in user-facing messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueType::Integer => "int",
            ValueType::Float => "float",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

fn default_value_type() -> ValueType {
    ValueType::Integer
}

/// Inclusive numeric bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// How loosely raw JSON values are converted to the declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionPolicy {
    /// Numbers, booleans as 0/1 and numeric strings. Floats are truncated
    /// toward zero for integer fields.
    #[default]
    Lenient,
    /// JSON numbers only. Integer fields reject fractional values.
    Strict,
}

fn default_required() -> bool {
    true
}

/// Contract for one input field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldRule {
    pub name: String,

    #[serde(rename = "type", default = "default_value_type")]
    pub value_type: ValueType,

    #[serde(default = "default_required")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,

    /// Permitted values, compared after coercion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldRule {
    /// Create a required rule with no constraints
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            required: true,
            range: None,
            allowed_values: None,
            description: None,
        }
    }

    /// Create a required integer rule
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Integer)
    }

    /// Create a required float rule
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Float)
    }

    /// Mark the field as optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set inclusive bounds
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some(Range::new(min, max));
        self
    }

    /// Set the permitted values
    pub fn with_allowed_values(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.allowed_values = Some(values.into_iter().collect());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether a coerced value is a member of the allowed set
    ///
    /// Always true when the rule has no allowed set.
    pub fn allows(&self, value: f64) -> bool {
        match &self.allowed_values {
            Some(values) => values.iter().any(|v| *v == value),
            None => true,
        }
    }

    /// Render the allowed set as `[a, b, c]`
    pub fn allowed_values_display(&self) -> String {
        let values = self.allowed_values.as_deref().unwrap_or(&[]);
        let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        format!("[{}]", rendered.join(", "))
    }

    fn check(&self) -> Result<(), SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::EmptyName);
        }

        if let Some(range) = &self.range {
            if !range.min.is_finite() || !range.max.is_finite() {
                return Err(SchemaError::NonFiniteBound(self.name.clone()));
            }
            if range.min > range.max {
                return Err(SchemaError::InvalidRange {
                    field: self.name.clone(),
                    min: range.min,
                    max: range.max,
                });
            }
        }

        if let Some(values) = &self.allowed_values {
            if values.is_empty() {
                return Err(SchemaError::EmptyAllowedValues(self.name.clone()));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(SchemaError::NonFiniteBound(self.name.clone()));
            }
        }

        Ok(())
    }
}

/// Schema misconfiguration, detected when the schema is built
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema has no fields")]
    Empty,

    #[error("Field name must not be empty")]
    EmptyName,

    #[error("Duplicate field '{0}'")]
    DuplicateField(String),

    #[error("Field '{field}' has min {min} greater than max {max}")]
    InvalidRange { field: String, min: f64, max: f64 },

    #[error("Field '{0}' declares an empty allowed-value set")]
    EmptyAllowedValues(String),

    #[error("Field '{0}' has a non-finite bound or allowed value")]
    NonFiniteBound(String),

    #[error("Unsupported schema format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse schema: {0}")]
    Parse(String),
}

/// Serialization format of a schema document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Json,
    Yaml,
    Toml,
}

impl SchemaFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(SchemaFormat::Json),
            "yaml" | "yml" => Ok(SchemaFormat::Yaml),
            "toml" => Ok(SchemaFormat::Toml),
            other => Err(SchemaError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// On-disk shape of a schema
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDocument {
    #[serde(default)]
    coercion: CoercionPolicy,
    fields: Vec<FieldRule>,
}

impl TryFrom<SchemaDocument> for Schema {
    type Error = SchemaError;

    fn try_from(doc: SchemaDocument) -> Result<Self, Self::Error> {
        Schema::new(doc.fields).map(|schema| schema.with_coercion(doc.coercion))
    }
}

/// Ordered, immutable collection of field rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDocument")]
pub struct Schema {
    coercion: CoercionPolicy,
    fields: Vec<FieldRule>,
}

impl Schema {
    /// Build a schema, rejecting misconfigured rules
    pub fn new(fields: Vec<FieldRule>) -> Result<Self, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen = HashSet::new();
        for rule in &fields {
            rule.check()?;
            if !seen.insert(rule.name.as_str()) {
                return Err(SchemaError::DuplicateField(rule.name.clone()));
            }
        }

        Ok(Self {
            coercion: CoercionPolicy::default(),
            fields,
        })
    }

    /// Replace the coercion policy
    pub fn with_coercion(mut self, coercion: CoercionPolicy) -> Self {
        self.coercion = coercion;
        self
    }

    /// The 13-field clinical record used by the heart disease model
    ///
    /// `oldpeak` is a continuous ST-depression measurement but is declared
    /// as an integer in {0..5}; fractional inputs are truncated. A schema
    /// file can redeclare it as `float` together with a matching model.
    pub fn heart_disease() -> Self {
        let binary = [0.0, 1.0];
        let fields = vec![
            FieldRule::integer("age")
                .with_range(18.0, 100.0)
                .with_description("Age in years"),
            FieldRule::integer("sex")
                .with_allowed_values(binary)
                .with_description("Sex (1 = male, 0 = female)"),
            FieldRule::integer("cp")
                .with_allowed_values([0.0, 1.0, 2.0, 3.0])
                .with_description("Chest pain type"),
            FieldRule::integer("trestbps")
                .with_range(90.0, 200.0)
                .with_description("Resting blood pressure (mm Hg)"),
            FieldRule::integer("chol")
                .with_range(120.0, 570.0)
                .with_description("Serum cholesterol (mg/dl)"),
            FieldRule::integer("fbs")
                .with_allowed_values(binary)
                .with_description("Fasting blood sugar > 120 mg/dl"),
            FieldRule::integer("restecg")
                .with_allowed_values([0.0, 1.0, 2.0])
                .with_description("Resting electrocardiographic results"),
            FieldRule::integer("thalach")
                .with_range(60.0, 220.0)
                .with_description("Maximum heart rate achieved"),
            FieldRule::integer("exang")
                .with_allowed_values(binary)
                .with_description("Exercise induced angina"),
            FieldRule::integer("oldpeak")
                .with_allowed_values([0.0, 1.0, 2.0, 3.0, 4.0, 5.0])
                .with_description("ST depression induced by exercise relative to rest"),
            FieldRule::integer("slope")
                .with_allowed_values([0.0, 1.0, 2.0])
                .with_description("Slope of the peak exercise ST segment"),
            FieldRule::integer("ca")
                .with_allowed_values([0.0, 1.0, 2.0, 3.0])
                .with_description("Number of major vessels colored by fluoroscopy"),
            FieldRule::integer("thal")
                .with_allowed_values([0.0, 1.0, 2.0, 3.0])
                .with_description("Thalassemia"),
        ];

        Self {
            coercion: CoercionPolicy::default(),
            fields,
        }
    }

    /// Load a schema document, choosing the format by extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let format = SchemaFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        let schema = Self::parse(&content, format)?;

        tracing::info!(
            path = %path.display(),
            fields = schema.len(),
            coercion = ?schema.coercion,
            "Loaded schema"
        );

        Ok(schema)
    }

    /// Parse a schema document
    pub fn parse(content: &str, format: SchemaFormat) -> Result<Self, SchemaError> {
        let parsed = match format {
            SchemaFormat::Json => {
                serde_json::from_str::<SchemaDocument>(content).map_err(|e| e.to_string())
            }
            SchemaFormat::Yaml => {
                serde_yaml::from_str::<SchemaDocument>(content).map_err(|e| e.to_string())
            }
            SchemaFormat::Toml => {
                toml::from_str::<SchemaDocument>(content).map_err(|e| e.to_string())
            }
        };

        parsed.map_err(SchemaError::Parse)?.try_into()
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|rule| rule.name.as_str())
    }

    pub fn coercion(&self) -> CoercionPolicy {
        self.coercion
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heart_disease_schema_is_well_formed() {
        let schema = Schema::heart_disease();
        assert_eq!(schema.len(), 13);
        assert!(Schema::new(schema.fields().to_vec()).is_ok());

        let names: Vec<&str> = schema.field_names().collect();
        assert_eq!(
            names,
            vec![
                "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang",
                "oldpeak", "slope", "ca", "thal"
            ]
        );
        assert!(schema.fields().iter().all(|f| f.required));
        assert!(schema
            .fields()
            .iter()
            .all(|f| f.value_type == ValueType::Integer));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = Schema::new(vec![FieldRule::integer("age"), FieldRule::integer("age")]);
        assert!(matches!(result, Err(SchemaError::DuplicateField(name)) if name == "age"));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let result = Schema::new(vec![FieldRule::integer("age").with_range(100.0, 18.0)]);
        assert!(matches!(result, Err(SchemaError::InvalidRange { .. })));
    }

    #[test]
    fn test_empty_allowed_set_rejected() {
        let result = Schema::new(vec![FieldRule::integer("sex").with_allowed_values([])]);
        assert!(matches!(result, Err(SchemaError::EmptyAllowedValues(_))));
    }

    #[test]
    fn test_empty_schema_rejected() {
        assert!(matches!(Schema::new(vec![]), Err(SchemaError::Empty)));
    }

    #[test]
    fn test_allowed_values_display() {
        let rule = FieldRule::integer("sex").with_allowed_values([0.0, 1.0]);
        assert_eq!(rule.allowed_values_display(), "[0, 1]");
        assert!(rule.allows(1.0));
        assert!(!rule.allows(5.0));
    }

    #[test]
    fn test_range_is_inclusive() {
        let range = Range::new(18.0, 100.0);
        assert!(range.contains(18.0));
        assert!(range.contains(100.0));
        assert!(!range.contains(17.0));
        assert!(!range.contains(101.0));
    }

    #[test]
    fn test_parse_toml_document() {
        let doc = r#"
            coercion = "strict"

            [[fields]]
            name = "age"
            type = "int"
            range = { min = 18, max = 100 }

            [[fields]]
            name = "oldpeak"
            type = "float"
            required = false
            range = { min = 0, max = 6.2 }
        "#;

        let schema = Schema::parse(doc, SchemaFormat::Toml).unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.coercion(), CoercionPolicy::Strict);

        let oldpeak = schema.get("oldpeak").unwrap();
        assert_eq!(oldpeak.value_type, ValueType::Float);
        assert!(!oldpeak.required);
        assert_eq!(oldpeak.range, Some(Range::new(0.0, 6.2)));
    }

    #[test]
    fn test_parse_yaml_document_defaults() {
        let doc = r#"
fields:
  - name: sex
    allowed_values: [0, 1]
"#;
        let schema = Schema::parse(doc, SchemaFormat::Yaml).unwrap();
        let sex = schema.get("sex").unwrap();
        assert_eq!(sex.value_type, ValueType::Integer);
        assert!(sex.required);
        assert_eq!(schema.coercion(), CoercionPolicy::Lenient);
    }

    #[test]
    fn test_parse_rejects_misconfigured_document() {
        let doc = r#"{"fields": [{"name": "a"}, {"name": "a"}]}"#;
        assert!(matches!(
            Schema::parse(doc, SchemaFormat::Json),
            Err(SchemaError::DuplicateField(_))
        ));
        assert!(matches!(
            Schema::parse("{not json", SchemaFormat::Json),
            Err(SchemaError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let flat_bounds = r#"{"fields": [{"name": "age", "min": 18, "max": 100}]}"#;
        assert!(matches!(
            Schema::parse(flat_bounds, SchemaFormat::Json),
            Err(SchemaError::Parse(msg)) if msg.contains("min")
        ));

        let typo = "fields:\n  - name: sex\n    alowed_values: [0, 1]\n";
        assert!(matches!(
            Schema::parse(typo, SchemaFormat::Yaml),
            Err(SchemaError::Parse(_))
        ));

        let range_key = "[[fields]]\nname = \"age\"\nrange = { min = 18, maximum = 100 }\n";
        assert!(matches!(
            Schema::parse(range_key, SchemaFormat::Toml),
            Err(SchemaError::Parse(_))
        ));

        let top_level = r#"{"coercion": "strict", "version": 2, "fields": [{"name": "age"}]}"#;
        assert!(matches!(
            Schema::parse(top_level, SchemaFormat::Json),
            Err(SchemaError::Parse(_))
        ));
    }

    #[test]
    fn test_value_type_serializes_as_message_name() {
        assert_eq!(serde_json::to_value(ValueType::Integer).unwrap(), "int");
        assert_eq!(serde_json::to_value(ValueType::Float).unwrap(), "float");
        let rule: FieldRule =
            serde_json::from_str(r#"{"name": "age", "type": "integer"}"#).unwrap();
        assert_eq!(rule.value_type, ValueType::Integer);
        assert_eq!(
            serde_json::to_value(&rule).unwrap()["type"],
            rule.value_type.type_name()
        );
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            SchemaFormat::from_path(Path::new("rules.yml")).unwrap(),
            SchemaFormat::Yaml
        );
        assert_eq!(
            SchemaFormat::from_path(Path::new("rules.JSON")).unwrap(),
            SchemaFormat::Json
        );
        assert!(SchemaFormat::from_path(Path::new("rules.ini")).is_err());
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(
            &path,
            r#"{"fields": [{"name": "age", "range": {"min": 18, "max": 100}}]}"#,
        )
        .unwrap();

        let schema = Schema::from_path(&path).unwrap();
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["age"]);
    }
}
