//! Soups and their persisted definitions.
//!
//! A soup is a named collection of documents with a fixed set of index
//! specs. Each soup is backed by one table:
//!
//! ```text
//! soup_names                       TABLE_<id>
//! ├─ id          (soup id)         ├─ id            (soup entry id)
//! ├─ soupName                      ├─ soup          (document JSON)
//! └─ indexSpecs  (JSON columns)    ├─ created       (Unix millis)
//!                                  ├─ lastModified  (Unix millis)
//!                                  └─ TABLE_<id>_<n> (one per index)
//! ```

mod registry;

pub use registry::SoupRegistry;

use crate::index::{canonical_path, IndexColumn, IndexSpec, IndexType};
use std::collections::HashSet;

/// Name of the metadata table listing every soup.
pub(crate) const SOUP_NAMES_TABLE: &str = "soup_names";

/// A registered soup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soup {
    id: i64,
    name: String,
    columns: Vec<IndexColumn>,
}

impl Soup {
    pub(crate) fn new(id: i64, name: impl Into<String>, columns: Vec<IndexColumn>) -> Self {
        Self {
            id,
            name: name.into(),
            columns,
        }
    }

    /// Soup name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Row id of the soup in the metadata table.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Name of the backing table.
    #[must_use]
    pub fn table_name(&self) -> String {
        table_name(self.id)
    }

    /// Index columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[IndexColumn] {
        &self.columns
    }

    /// Index specs in declaration order.
    #[must_use]
    pub fn index_specs(&self) -> Vec<IndexSpec> {
        self.columns.iter().map(IndexColumn::spec).collect()
    }

    /// The column storing `path`, if the path is indexed.
    ///
    /// `a/b` and `a.b` name the same column.
    #[must_use]
    pub fn column_for(&self, path: &str) -> Option<&IndexColumn> {
        let path = canonical_path(path);
        self.columns
            .iter()
            .find(|c| canonical_path(&c.path) == path)
    }

    /// True if `specs` declares the same set of indexes, in any order and
    /// with either path separator.
    #[must_use]
    pub fn has_same_specs(&self, specs: &[IndexSpec]) -> bool {
        let ours: HashSet<(String, IndexType)> = self
            .columns
            .iter()
            .map(|c| (canonical_path(&c.path), c.index_type))
            .collect();
        let theirs: HashSet<(String, IndexType)> = specs
            .iter()
            .map(|s| (s.canonical_path(), s.index_type))
            .collect();
        ours == theirs && specs.len() == self.columns.len()
    }

    /// Column name for a newly added index.
    ///
    /// The number follows the highest column in use. Removing an index
    /// drops its column, so a freed number can be handed out again.
    pub(crate) fn next_column_name(&self) -> String {
        let table = self.table_name();
        let prefix = format!("{table}_");
        let next = self
            .columns
            .iter()
            .filter_map(|c| c.column.strip_prefix(&prefix)?.parse::<usize>().ok())
            .max()
            .map_or(0, |n| n + 1);
        format!("{table}_{next}")
    }
}

pub(crate) fn table_name(soup_id: i64) -> String {
    format!("TABLE_{soup_id}")
}

/// Quotes an SQL identifier.
pub(crate) fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soup() -> Soup {
        Soup::new(
            3,
            "people",
            vec![
                IndexColumn {
                    path: "lastName".into(),
                    index_type: IndexType::String,
                    column: "TABLE_3_0".into(),
                },
                IndexColumn {
                    path: "age".into(),
                    index_type: IndexType::Integer,
                    column: "TABLE_3_2".into(),
                },
            ],
        )
    }

    #[test]
    fn table_and_columns() {
        let soup = soup();
        assert_eq!(soup.table_name(), "TABLE_3");
        assert_eq!(soup.column_for("age").unwrap().column, "TABLE_3_2");
        assert!(soup.column_for("firstName").is_none());
        assert!(soup.column_for("age/").is_none());
        assert_eq!(soup.next_column_name(), "TABLE_3_3");
    }

    #[test]
    fn spec_set_comparison_ignores_order() {
        let soup = soup();
        assert!(soup.has_same_specs(&[IndexSpec::integer("age"), IndexSpec::string("lastName")]));
        assert!(!soup.has_same_specs(&[IndexSpec::string("lastName")]));
        assert!(!soup.has_same_specs(&[IndexSpec::string("lastName"), IndexSpec::string("age")]));
    }

    #[test]
    fn separators_are_interchangeable() {
        let soup = Soup::new(
            4,
            "mail",
            vec![IndexColumn {
                path: "a.zip".into(),
                index_type: IndexType::Integer,
                column: "TABLE_4_0".into(),
            }],
        );
        assert_eq!(soup.column_for("a/zip").unwrap().column, "TABLE_4_0");
        assert!(soup.has_same_specs(&[IndexSpec::integer("a/zip")]));
        assert!(!soup.has_same_specs(&[IndexSpec::string("a/zip")]));
    }

    #[test]
    fn quoting() {
        assert_eq!(quote("TABLE_1"), "\"TABLE_1\"");
        assert_eq!(quote("a\"b"), "\"a\"\"b\"");
    }
}
