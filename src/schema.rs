//! Schema validation for write payloads.
//!
//! Collections delegate validation to a [`Validator`]. [`FieldSchema`] is a
//! small built-in implementation covering required fields and JSON kinds;
//! anything richer plugs in through the trait.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// == Validator ==
/// Checks a write payload and returns the value to persist.
pub trait Validator: Send + Sync {
    fn validate(&self, input: Value) -> Result<Value, ValidationError>;
}

impl<F> Validator for F
where
    F: Fn(Value) -> Result<Value, ValidationError> + Send + Sync,
{
    fn validate(&self, input: Value) -> Result<Value, ValidationError> {
        self(input)
    }
}

// == Validation Error ==
/// A single violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Offending field, empty for the document itself
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "is required")
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} {}", self.field, self.message)
        }
    }
}

/// Payload rejected by a schema. Carries every violation found.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("validation failed: {}", join_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Error with a single document-level message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(vec![Violation::new("", message)])
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// == Field Kinds ==
/// JSON kind a field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Bool,
    Array,
    Object,
    Any,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Array => value.is_array(),
            FieldKind::Object => value.is_object(),
            FieldKind::Any => true,
        }
    }

    fn name(self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Number => "a number",
            FieldKind::Bool => "a boolean",
            FieldKind::Array => "an array",
            FieldKind::Object => "an object",
            FieldKind::Any => "any value",
        }
    }
}

#[derive(Debug, Clone)]
struct FieldRule {
    name: String,
    kind: FieldKind,
    required: bool,
}

// == Field Schema ==
/// Declarative object schema: named fields with kinds, required or optional.
///
/// Unknown fields pass through untouched. `null` counts as absent.
///
/// ```
/// use docbind::schema::{FieldKind, FieldSchema, Validator};
/// use serde_json::json;
///
/// let schema = FieldSchema::new()
///     .required("id", FieldKind::String)
///     .optional("tags", FieldKind::Array);
///
/// assert!(schema.validate(json!({"id": "1"})).is_ok());
/// assert!(schema.validate(json!({"tags": []})).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    fields: Vec<FieldRule>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldRule {
            name: name.into(),
            kind,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldRule {
            name: name.into(),
            kind,
            required: false,
        });
        self
    }
}

impl Validator for FieldSchema {
    fn validate(&self, input: Value) -> Result<Value, ValidationError> {
        let Some(object) = input.as_object() else {
            return Err(ValidationError::message("expected a JSON object"));
        };

        let violations: Vec<Violation> = self
            .fields
            .iter()
            .filter_map(|rule| match object.get(&rule.name) {
                None | Some(Value::Null) if rule.required => Some(Violation::missing(&rule.name)),
                None | Some(Value::Null) => None,
                Some(value) if !rule.kind.matches(value) => Some(Violation::new(
                    &rule.name,
                    format!("must be {}", rule.kind.name()),
                )),
                Some(_) => None,
            })
            .collect();

        if violations.is_empty() {
            Ok(input)
        } else {
            Err(ValidationError::new(violations))
        }
    }
}
