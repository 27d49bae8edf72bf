//! Query specs and their execution.
//!
//! A [`QuerySpec`] is translated into SQL against the soup's backing table.
//! Indexed paths, and the reserved `_soupEntryId`, `_soupCreatedDate` and
//! `_soupLastModifiedDate` paths, are matched on typed columns. Any other
//! path is read out of the stored document with `json_extract`.
//!
//! Results are ordered by `order_path` when given and by entry id otherwise,
//! with entry id as the tie breaker, so paging is deterministic.

mod spec;
mod sql;

pub use spec::{QueryKind, QuerySpec, SortOrder};

use crate::error::{CoreError, CoreResult};
use crate::row;
use crate::soup::Soup;
use soupdb_codec::Value;
use soupdb_storage::SqlBackend;
use tracing::debug;

/// Number of entries the query matches.
pub(crate) fn count_entries(
    backend: &mut dyn SqlBackend,
    soup: &Soup,
    spec: &QuerySpec,
) -> CoreResult<usize> {
    spec.validate()?;
    let stmt = sql::count(soup, spec)?;
    let rows = backend.query(&stmt.sql, &stmt.params)?;
    let count = rows
        .first()
        .map(|r| row::integer(r, 0))
        .transpose()?
        .unwrap_or(0);
    usize::try_from(count).map_err(|_| CoreError::invalid_format("negative entry count"))
}

/// One page of matching documents.
///
/// Pages past the end are empty.
pub(crate) fn query_page(
    backend: &mut dyn SqlBackend,
    soup: &Soup,
    spec: &QuerySpec,
    page_index: usize,
) -> CoreResult<Vec<Value>> {
    spec.validate()?;
    let offset = page_index
        .checked_mul(spec.page_size)
        .and_then(|n| i64::try_from(n).ok());
    let (Some(offset), Ok(limit)) = (offset, i64::try_from(spec.page_size)) else {
        return Ok(Vec::new());
    };

    let stmt = sql::select_page(soup, spec, limit, offset)?;
    let rows = backend.query(&stmt.sql, &stmt.params)?;
    let documents = rows
        .iter()
        .map(|r| row::document(r, 0, soup.name()))
        .collect::<CoreResult<Vec<_>>>()?;
    debug!(
        target: "soupdb::query",
        soup = soup.name(),
        page = page_index,
        returned = documents.len(),
        "query page"
    );
    Ok(documents)
}

/// Entry ids whose value at `path` equals `value`, at most `limit` of them.
pub(crate) fn matching_ids(
    backend: &mut dyn SqlBackend,
    soup: &Soup,
    path: &str,
    value: &Value,
    limit: i64,
) -> CoreResult<Vec<i64>> {
    let stmt = sql::select_ids(soup, path, value, limit)?;
    let rows = backend.query(&stmt.sql, &stmt.params)?;
    rows.iter().map(|r| row::integer(r, 0)).collect()
}
