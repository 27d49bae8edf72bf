//! Entry reads and writes.
//!
//! Every write keeps the stored document, its timestamps and its index
//! columns in step. Batches run inside one transaction, so a failing
//! document leaves the soup exactly as it was before the batch.

use crate::error::{CoreError, CoreResult};
use crate::index::columns_for;
use crate::query::matching_ids;
use crate::row;
use crate::soup::{quote, Soup};
use crate::types::{now_millis, EntryTimestamps, SoupEntryId, SOUP_ENTRY_ID};
use soupdb_codec::{encode, DocPath, Value};
use soupdb_storage::{SqlBackend, SqlValue, Transaction};
use tracing::debug;

/// Max ids per `IN (...)` list.
const ID_CHUNK: usize = 500;

/// Fetches documents by entry id, in the order the ids were given.
///
/// Unknown ids are skipped. Repeated ids yield repeated documents.
pub(crate) fn retrieve(
    backend: &mut dyn SqlBackend,
    soup: &Soup,
    ids: &[SoupEntryId],
) -> CoreResult<Vec<Value>> {
    let mut found = std::collections::HashMap::with_capacity(ids.len());
    for chunk in ids.chunks(ID_CHUNK) {
        let sql = format!(
            "SELECT id, soup FROM {} WHERE id IN ({})",
            quote(&soup.table_name()),
            placeholders(chunk.len())
        );
        let params: Vec<SqlValue> = chunk.iter().map(|id| SqlValue::Integer(id.0)).collect();
        for r in backend.query(&sql, &params)? {
            found.insert(row::integer(&r, 0)?, row::document(&r, 1, soup.name())?);
        }
    }
    Ok(ids.iter().filter_map(|id| found.get(&id.0).cloned()).collect())
}

/// Inserts or updates a batch of documents, returning them as stored.
///
/// # Errors
///
/// - `Validation` if a document is not an object or lacks the external id
/// - `AmbiguousMatch` if an external id matches several entries
pub(crate) fn upsert(
    backend: &mut dyn SqlBackend,
    soup: &Soup,
    documents: Vec<Value>,
    external_id_path: Option<&str>,
) -> CoreResult<Vec<Value>> {
    let external = external_id_path.map(DocPath::parse).transpose()?;
    if let Some(index) = documents.iter().position(|d| d.as_map().is_none()) {
        return Err(CoreError::validation(format!(
            "document {index} is a {}, expected an object",
            documents[index].kind_name()
        )));
    }

    let now = now_millis();
    let mut txn = Transaction::begin(backend)?;
    let mut stored = Vec::with_capacity(documents.len());
    for document in documents {
        stored.push(upsert_one(
            txn.backend(),
            soup,
            document,
            external.as_ref(),
            now,
        )?);
    }
    txn.commit()?;

    debug!(target: "soupdb::entry", soup = soup.name(), count = stored.len(), "upserted entries");
    Ok(stored)
}

fn upsert_one(
    backend: &mut dyn SqlBackend,
    soup: &Soup,
    mut document: Value,
    external: Option<&DocPath>,
    now: i64,
) -> CoreResult<Value> {
    match resolve_existing(backend, soup, &document, external)? {
        Some(id) => {
            document.insert(SOUP_ENTRY_ID, Value::Integer(id));
            update(backend, soup, &document, id, now)?;
        }
        None => {
            document.remove(SOUP_ENTRY_ID);
            let id = insert(backend, soup, &document, now)?;
            document.insert(SOUP_ENTRY_ID, Value::Integer(id));
            backend.execute(
                &format!("UPDATE {} SET soup = ? WHERE id = ?", quote(&soup.table_name())),
                &[SqlValue::Text(encode(&document)?), SqlValue::Integer(id)],
            )?;
        }
    }
    Ok(document)
}

/// Finds the entry a document should overwrite, if any.
///
/// An embedded `_soupEntryId` that names a live entry wins. Otherwise the
/// external id path decides: no match inserts, one match updates.
fn resolve_existing(
    backend: &mut dyn SqlBackend,
    soup: &Soup,
    document: &Value,
    external: Option<&DocPath>,
) -> CoreResult<Option<i64>> {
    match document.get(SOUP_ENTRY_ID) {
        None | Some(Value::Null) => {}
        Some(Value::Integer(id)) => {
            if entry_exists(backend, soup, *id)? {
                return Ok(Some(*id));
            }
        }
        Some(other) => {
            return Err(CoreError::validation(format!(
                "{SOUP_ENTRY_ID} must be an integer, got {}",
                other.kind_name()
            )))
        }
    }

    let Some(path) = external else {
        return Ok(None);
    };
    if path.as_str() == SOUP_ENTRY_ID {
        return Ok(None);
    }

    let value = match document.at(path) {
        None | Some(Value::Null) => {
            return Err(CoreError::validation(format!(
                "document has no value at external id path {path}"
            )))
        }
        Some(value) => value,
    };

    let ids = matching_ids(backend, soup, path.as_str(), value, 2)?;
    match ids.as_slice() {
        [] => Ok(None),
        [id] => Ok(Some(*id)),
        _ => Err(CoreError::AmbiguousMatch {
            soup: soup.name().to_string(),
            path: path.to_string(),
            matches: ids.len(),
        }),
    }
}

fn entry_exists(backend: &mut dyn SqlBackend, soup: &Soup, id: i64) -> CoreResult<bool> {
    let rows = backend.query(
        &format!("SELECT 1 FROM {} WHERE id = ?", quote(&soup.table_name())),
        &[SqlValue::Integer(id)],
    )?;
    Ok(!rows.is_empty())
}

fn insert(backend: &mut dyn SqlBackend, soup: &Soup, document: &Value, now: i64) -> CoreResult<i64> {
    let mut sql = format!(
        "INSERT INTO {} (soup, created, lastModified",
        quote(&soup.table_name())
    );
    for column in soup.columns() {
        sql.push_str(", ");
        sql.push_str(&quote(&column.column));
    }
    sql.push_str(") VALUES (?, ?, ?");
    sql.push_str(&", ?".repeat(soup.columns().len()));
    sql.push(')');

    let mut params = vec![
        SqlValue::Text(encode(document)?),
        SqlValue::Integer(now),
        SqlValue::Integer(now),
    ];
    params.extend(columns_for(document, soup.columns()));
    backend.execute(&sql, &params)?;
    Ok(backend.last_inserted_id())
}

fn update(
    backend: &mut dyn SqlBackend,
    soup: &Soup,
    document: &Value,
    id: i64,
    now: i64,
) -> CoreResult<()> {
    let mut sql = format!(
        "UPDATE {} SET soup = ?, lastModified = ?",
        quote(&soup.table_name())
    );
    for column in soup.columns() {
        sql.push_str(", ");
        sql.push_str(&quote(&column.column));
        sql.push_str(" = ?");
    }
    sql.push_str(" WHERE id = ?");

    let mut params = vec![SqlValue::Text(encode(document)?), SqlValue::Integer(now)];
    params.extend(columns_for(document, soup.columns()));
    params.push(SqlValue::Integer(id));
    backend.execute(&sql, &params)?;
    Ok(())
}

/// Deletes entries by id, returning how many existed.
pub(crate) fn remove(
    backend: &mut dyn SqlBackend,
    soup: &Soup,
    ids: &[SoupEntryId],
) -> CoreResult<usize> {
    let mut txn = Transaction::begin(backend)?;
    let mut removed = 0;
    for chunk in ids.chunks(ID_CHUNK) {
        let params: Vec<SqlValue> = chunk.iter().map(|id| SqlValue::Integer(id.0)).collect();
        removed += txn.execute(
            &format!(
                "DELETE FROM {} WHERE id IN ({})",
                quote(&soup.table_name()),
                placeholders(chunk.len())
            ),
            &params,
        )?;
    }
    txn.commit()?;

    debug!(target: "soupdb::entry", soup = soup.name(), removed, "removed entries");
    Ok(removed)
}

/// Created and last-modified times of an entry.
pub(crate) fn timestamps(
    backend: &mut dyn SqlBackend,
    soup: &Soup,
    id: SoupEntryId,
) -> CoreResult<Option<EntryTimestamps>> {
    let rows = backend.query(
        &format!(
            "SELECT created, lastModified FROM {} WHERE id = ?",
            quote(&soup.table_name())
        ),
        &[SqlValue::Integer(id.0)],
    )?;
    rows.first()
        .map(|r| {
            Ok(EntryTimestamps {
                created: row::integer(r, 0)?,
                last_modified: row::integer(r, 1)?,
            })
        })
        .transpose()
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::index::IndexSpec;
    use crate::soup::SoupRegistry;
    use soupdb_codec::decode;
    use soupdb_storage::SqliteBackend;

    fn setup(specs: &[IndexSpec]) -> (SqliteBackend, Soup) {
        let mut backend = SqliteBackend::open_in_memory().unwrap();
        let mut registry = SoupRegistry::load(&mut backend).unwrap();
        let soup = registry.register(&mut backend, "people", specs).unwrap();
        (backend, soup)
    }

    fn doc(json: &str) -> Value {
        decode(json).unwrap()
    }

    fn entry_id(document: &Value) -> SoupEntryId {
        SoupEntryId(document.get(SOUP_ENTRY_ID).unwrap().as_integer().unwrap())
    }

    #[test]
    fn insert_assigns_ids_and_stores_document() {
        let (mut backend, soup) = setup(&[IndexSpec::string("lastName")]);
        let stored = upsert(
            &mut backend,
            &soup,
            vec![doc(r#"{"lastName":"Lovelace"}"#), doc(r#"{"lastName":"Turing"}"#)],
            None,
        )
        .unwrap();

        let first = entry_id(&stored[0]);
        let second = entry_id(&stored[1]);
        assert!(first < second);

        let fetched = retrieve(&mut backend, &soup, &[second, first]).unwrap();
        assert_eq!(fetched, vec![stored[1].clone(), stored[0].clone()]);
    }

    #[test]
    fn embedded_id_updates_in_place() {
        let (mut backend, soup) = setup(&[IndexSpec::integer("age")]);
        let mut stored = upsert(&mut backend, &soup, vec![doc(r#"{"age":36}"#)], None).unwrap();
        let id = entry_id(&stored[0]);

        stored[0].insert("age", Value::from(37));
        let updated = upsert(&mut backend, &soup, stored, None).unwrap();
        assert_eq!(entry_id(&updated[0]), id);

        let fetched = retrieve(&mut backend, &soup, &[id]).unwrap();
        assert_eq!(fetched[0].get("age"), Some(&Value::from(37)));
    }

    #[test]
    fn stale_embedded_id_inserts_fresh_entry() {
        let (mut backend, soup) = setup(&[]);
        let stored = upsert(
            &mut backend,
            &soup,
            vec![doc(r#"{"_soupEntryId": 999, "x": 1}"#)],
            None,
        )
        .unwrap();
        assert_ne!(entry_id(&stored[0]), SoupEntryId(999));
    }

    #[test]
    fn external_id_updates_single_match() {
        let (mut backend, soup) = setup(&[IndexSpec::string("email")]);
        let first = upsert(
            &mut backend,
            &soup,
            vec![doc(r#"{"email":"ada@example.com","n":1}"#)],
            Some("email"),
        )
        .unwrap();
        let second = upsert(
            &mut backend,
            &soup,
            vec![doc(r#"{"email":"ada@example.com","n":2}"#)],
            Some("email"),
        )
        .unwrap();

        assert_eq!(entry_id(&first[0]), entry_id(&second[0]));
        let fetched = retrieve(&mut backend, &soup, &[entry_id(&first[0])]).unwrap();
        assert_eq!(fetched[0].get("n"), Some(&Value::from(2)));
    }

    #[test]
    fn external_id_on_unindexed_path() {
        let (mut backend, soup) = setup(&[]);
        upsert(&mut backend, &soup, vec![doc(r#"{"key":"k1","v":1}"#)], Some("key")).unwrap();
        upsert(&mut backend, &soup, vec![doc(r#"{"key":"k1","v":2}"#)], Some("key")).unwrap();

        let stmt_rows = backend
            .query(&format!("SELECT COUNT(*) FROM {}", quote(&soup.table_name())), &[])
            .unwrap();
        assert_eq!(stmt_rows[0][0], SqlValue::Integer(1));
    }

    #[test]
    fn external_id_with_numeric_object_key() {
        let (mut backend, soup) = setup(&[]);
        let first = upsert(
            &mut backend,
            &soup,
            vec![doc(r#"{"codes":{"0":"x"},"v":1}"#)],
            Some("codes.0"),
        )
        .unwrap();
        let second = upsert(
            &mut backend,
            &soup,
            vec![doc(r#"{"codes":{"0":"x"},"v":2}"#)],
            Some("codes.0"),
        )
        .unwrap();

        assert_eq!(
            first[0].get(SOUP_ENTRY_ID),
            second[0].get(SOUP_ENTRY_ID)
        );
        let rows = backend
            .query(&format!("SELECT COUNT(*) FROM {}", quote(&soup.table_name())), &[])
            .unwrap();
        assert_eq!(rows[0][0], SqlValue::Integer(1));
    }

    #[test]
    fn ambiguous_external_id_rolls_back_batch() {
        let (mut backend, soup) = setup(&[IndexSpec::string("name")]);
        upsert(
            &mut backend,
            &soup,
            vec![doc(r#"{"name":"dup"}"#), doc(r#"{"name":"dup"}"#)],
            None,
        )
        .unwrap();

        let err = upsert(
            &mut backend,
            &soup,
            vec![doc(r#"{"name":"fresh"}"#), doc(r#"{"name":"dup"}"#)],
            Some("name"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousMatch);

        let rows = backend
            .query(&format!("SELECT COUNT(*) FROM {}", quote(&soup.table_name())), &[])
            .unwrap();
        assert_eq!(rows[0][0], SqlValue::Integer(2));
    }

    #[test]
    fn missing_external_id_is_invalid() {
        let (mut backend, soup) = setup(&[]);
        let err = upsert(&mut backend, &soup, vec![doc(r#"{"a":1}"#)], Some("email")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = upsert(&mut backend, &soup, vec![doc(r#"{"email":null}"#)], Some("email"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn non_object_documents_are_invalid() {
        let (mut backend, soup) = setup(&[]);
        let err = upsert(&mut backend, &soup, vec![Value::from(1)], None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = upsert(&mut backend, &soup, vec![doc(r#"{"_soupEntryId":"x"}"#)], None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn remove_ignores_unknown_ids() {
        let (mut backend, soup) = setup(&[]);
        let stored = upsert(&mut backend, &soup, vec![doc("{}"), doc("{}")], None).unwrap();
        let id = entry_id(&stored[0]);

        let removed = remove(&mut backend, &soup, &[id, SoupEntryId(12345)]).unwrap();
        assert_eq!(removed, 1);
        assert!(retrieve(&mut backend, &soup, &[id]).unwrap().is_empty());
        assert_eq!(retrieve(&mut backend, &soup, &[entry_id(&stored[1])]).unwrap().len(), 1);
    }

    #[test]
    fn timestamps_track_writes() {
        let (mut backend, soup) = setup(&[]);
        let stored = upsert(&mut backend, &soup, vec![doc("{}")], None).unwrap();
        let id = entry_id(&stored[0]);

        let before = timestamps(&mut backend, &soup, id).unwrap().unwrap();
        assert_eq!(before.created, before.last_modified);

        upsert(&mut backend, &soup, stored, None).unwrap();
        let after = timestamps(&mut backend, &soup, id).unwrap().unwrap();
        assert_eq!(after.created, before.created);
        assert!(after.last_modified >= before.last_modified);

        assert!(timestamps(&mut backend, &soup, SoupEntryId(77)).unwrap().is_none());
    }

    #[test]
    fn many_ids_are_chunked() {
        let (mut backend, soup) = setup(&[]);
        let docs = (0..(ID_CHUNK + 10)).map(|_| doc("{}")).collect();
        let stored = upsert(&mut backend, &soup, docs, None).unwrap();
        let ids: Vec<SoupEntryId> = stored.iter().map(entry_id).collect();

        assert_eq!(retrieve(&mut backend, &soup, &ids).unwrap().len(), ids.len());
        assert_eq!(remove(&mut backend, &soup, &ids).unwrap(), ids.len());
    }
}
