//! Conversion between [`RowValues`] and the engine's bound-parameter / column representation.

use rusqlite::types::{Value, ValueRef};
use serde_json::{Map, Number, Value as JsonValue};

use crate::error::SqlRecordError;
use crate::types::RowValues;

/// How a raw column value should be interpreted on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeHint {
    /// Use only the storage class reported by the engine.
    #[default]
    Plain,
    /// Column was declared with a boolean type; 0/1 become `Bool`.
    Boolean,
    /// Column was declared `JSON`; object/array text becomes `JSON`, anything else stays text.
    JsonLenient,
    /// Caller asked for structured text; malformed content is a `DecodeError`.
    Json,
}

impl DecodeHint {
    /// Derive the hint from a column's declared type.
    #[must_use]
    pub fn from_decl_type(decl: Option<&str>) -> Self {
        let Some(decl) = decl else {
            return DecodeHint::Plain;
        };
        let upper = decl.trim().to_ascii_uppercase();
        if upper == "JSON" || upper == "JSONB" {
            DecodeHint::JsonLenient
        } else if upper.contains("BOOL") {
            DecodeHint::Boolean
        } else {
            DecodeHint::Plain
        }
    }
}

/// Convert a single `RowValues` into an owned engine value for binding.
#[must_use]
pub fn encode(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Encode a parameter list in order.
#[must_use]
pub fn encode_all(values: &[RowValues]) -> Vec<Value> {
    values.iter().map(encode).collect()
}

/// Convert a raw column value into a `RowValues`.
///
/// # Errors
/// Returns `SqlRecordError::DecodeError` when `hint` is [`DecodeHint::Json`] and the stored text
/// is not valid JSON, or when stored text is not valid UTF-8.
pub fn decode(raw: ValueRef<'_>, hint: DecodeHint) -> Result<RowValues, SqlRecordError> {
    match raw {
        ValueRef::Null => Ok(RowValues::Null),
        ValueRef::Integer(i) => match (hint, i) {
            (DecodeHint::Boolean, 0) => Ok(RowValues::Bool(false)),
            (DecodeHint::Boolean, 1) => Ok(RowValues::Bool(true)),
            _ => Ok(RowValues::Int(i)),
        },
        ValueRef::Real(f) => Ok(RowValues::Float(f)),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| SqlRecordError::DecodeError(format!("column text is not UTF-8: {e}")))?;
            decode_text(text, hint)
        }
        ValueRef::Blob(bytes) => Ok(RowValues::Blob(bytes.to_vec())),
    }
}

fn decode_text(text: &str, hint: DecodeHint) -> Result<RowValues, SqlRecordError> {
    match hint {
        DecodeHint::Json => {
            let parsed: JsonValue = serde_json::from_str(text)
                .map_err(|e| SqlRecordError::DecodeError(format!("malformed JSON text: {e}")))?;
            Ok(RowValues::JSON(parsed))
        }
        DecodeHint::JsonLenient if looks_structured(text) => {
            match serde_json::from_str::<JsonValue>(text) {
                Ok(parsed) => Ok(RowValues::JSON(parsed)),
                Err(_) => Ok(RowValues::Text(text.to_owned())),
            }
        }
        _ => Ok(RowValues::Text(text.to_owned())),
    }
}

fn looks_structured(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}

/// Re-interpret an already decoded value as structured JSON.
///
/// # Errors
/// Returns `SqlRecordError::DecodeError` if the value is text that does not parse, or is a type
/// that cannot hold structured content.
pub fn decode_json(value: &RowValues) -> Result<JsonValue, SqlRecordError> {
    match value {
        RowValues::JSON(v) => Ok(v.clone()),
        RowValues::Text(s) => serde_json::from_str(s)
            .map_err(|e| SqlRecordError::DecodeError(format!("malformed JSON text: {e}"))),
        RowValues::Null => Ok(JsonValue::Null),
        other => Err(SqlRecordError::DecodeError(format!(
            "cannot decode {} as JSON",
            other.type_name()
        ))),
    }
}

/// Map a host JSON value onto a `RowValues`.
///
/// Integral numbers become `Int`, the rest `Float`; objects and arrays are kept as `JSON`.
#[must_use]
pub fn from_json(value: &JsonValue) -> RowValues {
    match value {
        JsonValue::Null => RowValues::Null,
        JsonValue::Bool(b) => RowValues::Bool(*b),
        JsonValue::Number(n) => n
            .as_i64()
            .map(RowValues::Int)
            .or_else(|| n.as_f64().map(RowValues::Float))
            .unwrap_or(RowValues::Null),
        JsonValue::String(s) => RowValues::Text(s.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => RowValues::JSON(value.clone()),
    }
}

/// Map a `RowValues` onto a JSON value for output.
#[must_use]
pub fn to_json(value: &RowValues) -> JsonValue {
    match value {
        RowValues::Int(i) => JsonValue::from(*i),
        RowValues::Float(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
        RowValues::Text(s) => JsonValue::String(s.clone()),
        RowValues::Bool(b) => JsonValue::Bool(*b),
        RowValues::Timestamp(dt) => JsonValue::String(dt.format("%F %T%.f").to_string()),
        RowValues::Null => JsonValue::Null,
        RowValues::JSON(v) => v.clone(),
        RowValues::Blob(bytes) => JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect()),
    }
}

/// Convert a host JSON object into a [`FieldMap`](crate::types::FieldMap).
///
/// # Errors
/// Returns `SqlRecordError::InvalidInsert` if `value` is not a JSON object.
pub fn field_map_from_json(value: &JsonValue) -> Result<crate::types::FieldMap, SqlRecordError> {
    let object: &Map<String, JsonValue> = value
        .as_object()
        .ok_or_else(|| SqlRecordError::InvalidInsert("expected a JSON object of fields".into()))?;
    Ok(object
        .iter()
        .map(|(k, v)| (k.clone(), from_json(v)))
        .collect())
}
