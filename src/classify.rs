//! Value classification
//!
//! Every value is tagged once as a scalar, a sequence or a mapping and the
//! engines branch on that tag instead of probing the value repeatedly.

use serde_json::Value;

/// Shape of a JSON value as far as flattening is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Fits in a single cell: null, boolean, number or string
    Scalar,
    /// Ordered and indexable
    Sequence,
    /// Keyed properties
    Mapping,
}

impl Shape {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Shape::Scalar,
            Value::Array(_) => Shape::Sequence,
            Value::Object(_) => Shape::Mapping,
        }
    }
}

pub fn is_scalar(value: &Value) -> bool {
    Shape::of(value) == Shape::Scalar
}

pub fn is_sequence(value: &Value) -> bool {
    Shape::of(value) == Shape::Sequence
}

/// JSON type name used in diagnostics and usage errors
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Render a value as cell text.
///
/// Strings are kept verbatim, null becomes an empty cell and containers are
/// written as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
