use super::spec::{IndexColumn, IndexType};
use soupdb_codec::{DocPath, Value};
use soupdb_storage::SqlValue;

/// Coerces a document value into the column representation of `index_type`.
///
/// Returns [`SqlValue::Null`] when the value has no representation in that
/// type. Booleans only have a string form.
#[must_use]
pub fn coerce(value: &Value, index_type: IndexType) -> SqlValue {
    match index_type {
        IndexType::String => match value {
            Value::Text(s) => SqlValue::Text(s.clone()),
            Value::Integer(n) => SqlValue::Text(n.to_string()),
            Value::Float(f) if f.is_finite() => SqlValue::Text(f.to_string()),
            Value::Bool(b) => SqlValue::Text(b.to_string()),
            _ => SqlValue::Null,
        },
        IndexType::Integer => match value {
            Value::Integer(n) => SqlValue::Integer(*n),
            Value::Float(f) => integral_float(*f).map_or(SqlValue::Null, SqlValue::Integer),
            Value::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_or(SqlValue::Null, SqlValue::Integer),
            _ => SqlValue::Null,
        },
        IndexType::Floating => match value {
            #[allow(clippy::cast_precision_loss)]
            Value::Integer(n) => SqlValue::Real(*n as f64),
            Value::Float(f) if f.is_finite() => SqlValue::Real(*f),
            Value::Text(s) => match s.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => SqlValue::Real(f),
                _ => SqlValue::Null,
            },
            _ => SqlValue::Null,
        },
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral_float(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Computes the value of every index column for a document.
///
/// Missing paths project to NULL. The result is in column order.
#[must_use]
pub fn columns_for(document: &Value, columns: &[IndexColumn]) -> Vec<SqlValue> {
    columns
        .iter()
        .map(|column| {
            DocPath::parse(&column.path)
                .ok()
                .and_then(|path| document.at(&path))
                .map_or(SqlValue::Null, |value| coerce(value, column.index_type))
        })
        .collect()
}
