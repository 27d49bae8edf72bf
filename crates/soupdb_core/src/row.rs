//! Typed access to backend rows.

use crate::error::{CoreError, CoreResult};
use soupdb_codec::Value;
use soupdb_storage::Row;

pub(crate) fn integer(row: &Row, index: usize) -> CoreResult<i64> {
    row.get(index)
        .and_then(|v| v.as_integer())
        .ok_or_else(|| CoreError::invalid_format(format!("expected integer in column {index}")))
}

pub(crate) fn text(row: &Row, index: usize) -> CoreResult<&str> {
    row.get(index)
        .and_then(|v| v.as_text())
        .ok_or_else(|| CoreError::invalid_format(format!("expected text in column {index}")))
}

/// Decodes a stored document column.
pub(crate) fn document(row: &Row, index: usize, soup: &str) -> CoreResult<Value> {
    soupdb_codec::decode(text(row, index)?).map_err(|e| {
        CoreError::invalid_format(format!("unreadable document in soup {soup}: {e}"))
    })
}
