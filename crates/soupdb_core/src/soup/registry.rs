//! Soup catalog backed by the metadata table.

use super::{quote, table_name, Soup, SOUP_NAMES_TABLE};
use crate::error::{CoreError, CoreResult};
use crate::index::{coerce, validate_specs, IndexColumn, IndexSpec};
use crate::row;
use soupdb_codec::DocPath;
use soupdb_storage::{SqlBackend, SqlValue, Transaction};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// In-memory view of the registered soups.
///
/// The metadata table is the source of truth. The registry mirrors it and is
/// only updated after the corresponding transaction commits, so a failed
/// operation leaves both unchanged.
#[derive(Debug, Default)]
pub struct SoupRegistry {
    soups: HashMap<String, Soup>,
}

impl SoupRegistry {
    /// Creates the metadata table if needed and loads every soup.
    ///
    /// Soups whose backing table has gone missing are skipped with a warning.
    pub fn load(backend: &mut dyn SqlBackend) -> CoreResult<Self> {
        backend.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {SOUP_NAMES_TABLE} (\
                 id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 soupName TEXT NOT NULL UNIQUE, \
                 indexSpecs TEXT NOT NULL)"
            ),
            &[],
        )?;

        let rows = backend.query(
            &format!("SELECT id, soupName, indexSpecs FROM {SOUP_NAMES_TABLE}"),
            &[],
        )?;

        let mut soups = HashMap::with_capacity(rows.len());
        for r in &rows {
            let id = row::integer(r, 0)?;
            let name = row::text(r, 1)?;
            let columns: Vec<IndexColumn> = serde_json::from_str(row::text(r, 2)?)
                .map_err(|e| {
                    CoreError::invalid_format(format!("index specs of soup {name}: {e}"))
                })?;

            if !backend.table_exists(&table_name(id))? {
                warn!(target: "soupdb::soup", soup = name, "backing table missing, skipping");
                continue;
            }
            soups.insert(name.to_string(), Soup::new(id, name, columns));
        }

        debug!(target: "soupdb::soup", count = soups.len(), "loaded soups");
        Ok(Self { soups })
    }

    /// True if a soup with this name is registered.
    pub fn exists(&self, name: &str) -> bool {
        self.soups.contains_key(name)
    }

    /// Looks up a soup.
    pub fn get(&self, name: &str) -> Option<&Soup> {
        self.soups.get(name)
    }

    /// Looks up a soup, failing with `SoupNotFound`.
    pub fn require(&self, name: &str) -> CoreResult<&Soup> {
        self.get(name).ok_or_else(|| CoreError::soup_not_found(name))
    }

    /// Names of all registered soups, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.soups.keys().cloned().collect();
        names.sort();
        names
    }

    /// Registers a soup, or confirms an identical existing registration.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty name or malformed specs
    /// - `Conflict` if the soup exists with a different spec set
    pub fn register(
        &mut self,
        backend: &mut dyn SqlBackend,
        name: &str,
        specs: &[IndexSpec],
    ) -> CoreResult<Soup> {
        if name.is_empty() {
            return Err(CoreError::validation("soup name is empty"));
        }
        validate_specs(specs)?;

        if let Some(existing) = self.soups.get(name) {
            if existing.has_same_specs(specs) {
                return Ok(existing.clone());
            }
            return Err(CoreError::conflict(
                name,
                "already registered with different index specs, use add_index or remove_index",
            ));
        }

        let mut txn = Transaction::begin(backend)?;
        txn.execute(
            &format!("INSERT INTO {SOUP_NAMES_TABLE} (soupName, indexSpecs) VALUES (?, ?)"),
            &[SqlValue::from(name), SqlValue::from("[]")],
        )?;
        let id = txn.last_inserted_id();
        let table = table_name(id);

        let columns: Vec<IndexColumn> = specs
            .iter()
            .enumerate()
            .map(|(n, spec)| IndexColumn {
                path: spec.path.clone(),
                index_type: spec.index_type,
                column: format!("{table}_{n}"),
            })
            .collect();

        let mut ddl = format!(
            "CREATE TABLE {} (id INTEGER PRIMARY KEY AUTOINCREMENT, soup TEXT NOT NULL, \
             created INTEGER NOT NULL, lastModified INTEGER NOT NULL",
            quote(&table)
        );
        for column in &columns {
            ddl.push_str(&format!(
                ", {} {}",
                quote(&column.column),
                column.index_type.sql_type()
            ));
        }
        ddl.push(')');
        txn.execute(&ddl, &[])?;

        for column in &columns {
            txn.execute(&create_index_sql(&table, column), &[])?;
        }
        write_columns(txn.backend(), id, &columns)?;
        txn.commit()?;

        let soup = Soup::new(id, name, columns);
        info!(target: "soupdb::soup", soup = name, table = %table, indexes = specs.len(), "registered soup");
        self.soups.insert(name.to_string(), soup.clone());
        Ok(soup)
    }

    /// Drops a soup and all of its entries. Unknown soups are ignored.
    pub fn remove(&mut self, backend: &mut dyn SqlBackend, name: &str) -> CoreResult<()> {
        let Some(soup) = self.soups.get(name) else {
            return Ok(());
        };

        let mut txn = Transaction::begin(backend)?;
        txn.execute(
            &format!("DROP TABLE IF EXISTS {}", quote(&soup.table_name())),
            &[],
        )?;
        txn.execute(
            &format!("DELETE FROM {SOUP_NAMES_TABLE} WHERE id = ?"),
            &[SqlValue::Integer(soup.id())],
        )?;
        txn.commit()?;

        info!(target: "soupdb::soup", soup = name, "removed soup");
        self.soups.remove(name);
        Ok(())
    }

    /// Adds an index to an existing soup and backfills it from stored entries.
    ///
    /// Adding a spec that is already declared is a no-op.
    ///
    /// # Errors
    ///
    /// `Conflict` if the path is already indexed with another type.
    pub fn add_index(
        &mut self,
        backend: &mut dyn SqlBackend,
        name: &str,
        spec: &IndexSpec,
    ) -> CoreResult<Soup> {
        spec.validate()?;
        let soup = self.require(name)?;
        if let Some(existing) = soup.column_for(&spec.path) {
            if existing.index_type == spec.index_type {
                return Ok(soup.clone());
            }
            return Err(CoreError::conflict(
                name,
                format!(
                    "path {} is already indexed as {}",
                    spec.path, existing.index_type
                ),
            ));
        }

        let table = soup.table_name();
        let column = IndexColumn {
            path: spec.path.clone(),
            index_type: spec.index_type,
            column: soup.next_column_name(),
        };
        let mut columns = soup.columns().to_vec();
        columns.push(column.clone());
        let updated = Soup::new(soup.id(), name, columns);

        let mut txn = Transaction::begin(backend)?;
        txn.execute(
            &format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                quote(&table),
                quote(&column.column),
                column.index_type.sql_type()
            ),
            &[],
        )?;
        txn.execute(&create_index_sql(&table, &column), &[])?;

        let path = DocPath::parse(&column.path)?;
        let rows = txn.query(&format!("SELECT id, soup FROM {}", quote(&table)), &[])?;
        let update = format!(
            "UPDATE {} SET {} = ? WHERE id = ?",
            quote(&table),
            quote(&column.column)
        );
        for r in &rows {
            let id = row::integer(r, 0)?;
            let document = row::document(r, 1, name)?;
            let value = document
                .at(&path)
                .map_or(SqlValue::Null, |v| coerce(v, column.index_type));
            if !value.is_null() {
                txn.execute(&update, &[value, SqlValue::Integer(id)])?;
            }
        }

        write_columns(txn.backend(), updated.id(), updated.columns())?;
        txn.commit()?;

        info!(target: "soupdb::soup", soup = name, index = %spec, backfilled = rows.len(), "added index");
        self.soups.insert(name.to_string(), updated.clone());
        Ok(updated)
    }

    /// Removes the index on `path`. Unindexed paths are a no-op.
    pub fn remove_index(
        &mut self,
        backend: &mut dyn SqlBackend,
        name: &str,
        path: &str,
    ) -> CoreResult<Soup> {
        let soup = self.require(name)?;
        let Some(column) = soup.column_for(path).cloned() else {
            return Ok(soup.clone());
        };

        let table = soup.table_name();
        let columns: Vec<IndexColumn> = soup
            .columns()
            .iter()
            .filter(|c| c.column != column.column)
            .cloned()
            .collect();
        let updated = Soup::new(soup.id(), name, columns);

        let mut txn = Transaction::begin(backend)?;
        txn.execute(
            &format!("DROP INDEX IF EXISTS {}", quote(&index_name(&column))),
            &[],
        )?;
        txn.execute(
            &format!(
                "ALTER TABLE {} DROP COLUMN {}",
                quote(&table),
                quote(&column.column)
            ),
            &[],
        )?;
        write_columns(txn.backend(), updated.id(), updated.columns())?;
        txn.commit()?;

        info!(target: "soupdb::soup", soup = name, path, "removed index");
        self.soups.insert(name.to_string(), updated.clone());
        Ok(updated)
    }
}

fn index_name(column: &IndexColumn) -> String {
    format!("{}_idx", column.column)
}

fn create_index_sql(table: &str, column: &IndexColumn) -> String {
    format!(
        "CREATE INDEX {} ON {} ({})",
        quote(&index_name(column)),
        quote(table),
        quote(&column.column)
    )
}

fn write_columns(backend: &mut dyn SqlBackend, id: i64, columns: &[IndexColumn]) -> CoreResult<()> {
    let json = serde_json::to_string(columns)
        .map_err(|e| CoreError::invalid_format(format!("encoding index specs: {e}")))?;
    backend.execute(
        &format!("UPDATE {SOUP_NAMES_TABLE} SET indexSpecs = ? WHERE id = ?"),
        &[SqlValue::Text(json), SqlValue::Integer(id)],
    )?;
    Ok(())
}
