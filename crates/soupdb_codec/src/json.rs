//! JSON text encoding and decoding.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use serde_json::{Map, Number};

/// Decode a document from JSON text.
///
/// Numbers that fit in an `i64` become [`Value::Integer`]; everything else
/// numeric becomes [`Value::Float`].
///
/// # Errors
///
/// Returns `DecodingFailed` if the text is not valid JSON.
pub fn decode(text: &str) -> CodecResult<Value> {
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| CodecError::decoding_failed(e.to_string()))?;
    Ok(Value::from(json))
}

/// Encode a document to compact JSON text.
///
/// # Errors
///
/// Returns `NonFiniteFloat` if the value contains NaN or an infinity.
pub fn encode(value: &Value) -> CodecResult<String> {
    let json = serde_json::Value::try_from(value)?;
    serde_json::to_string(&json).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Encode a document to indented JSON text.
///
/// # Errors
///
/// Returns `NonFiniteFloat` if the value contains NaN or an infinity.
pub fn encode_pretty(value: &Value) -> CodecResult<String> {
    let json = serde_json::Value::try_from(value)?;
    serde_json::to_string_pretty(&json).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(members) => Value::Map(
                members
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl TryFrom<&Value> for serde_json::Value {
    type Error = CodecError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Ok(match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(n) => serde_json::Value::Number(Number::from(*n)),
            Value::Float(f) => {
                serde_json::Value::Number(Number::from_f64(*f).ok_or(CodecError::NonFiniteFloat)?)
            }
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(serde_json::Value::try_from)
                    .collect::<CodecResult<Vec<_>>>()?,
            ),
            Value::Map(members) => {
                let mut object = Map::new();
                for (k, v) in members {
                    object.insert(k.clone(), serde_json::Value::try_from(v)?);
                }
                serde_json::Value::Object(object)
            }
        })
    }
}
