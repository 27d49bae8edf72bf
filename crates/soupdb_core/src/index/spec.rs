use crate::error::{CoreError, CoreResult};
use crate::types::{SOUP_CREATED_DATE, SOUP_ENTRY_ID, SOUP_LAST_MODIFIED_DATE};
use serde::{Deserialize, Serialize};
use soupdb_codec::DocPath;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Value type of an indexed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    /// Text values.
    String,
    /// 64-bit integers.
    Integer,
    /// Double-precision floats.
    Floating,
}

impl IndexType {
    /// SQL column type used for this index type.
    #[must_use]
    pub const fn sql_type(self) -> &'static str {
        match self {
            Self::String => "TEXT",
            Self::Integer => "INTEGER",
            Self::Floating => "REAL",
        }
    }

    /// Lowercase name as used in dictionaries and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Floating => "floating",
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "integer" => Ok(Self::Integer),
            "floating" => Ok(Self::Floating),
            other => Err(CoreError::validation(format!(
                "unknown index type {other:?}, expected string, integer or floating"
            ))),
        }
    }
}

/// A declared index: a document path plus the type its values are stored as.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Dot- or slash-separated path into the document.
    pub path: String,
    /// Storage type of the indexed values.
    #[serde(rename = "type")]
    pub index_type: IndexType,
}

impl IndexSpec {
    /// Creates an index spec.
    pub fn new(path: impl Into<String>, index_type: IndexType) -> Self {
        Self {
            path: path.into(),
            index_type,
        }
    }

    /// A string index on `path`.
    pub fn string(path: impl Into<String>) -> Self {
        Self::new(path, IndexType::String)
    }

    /// An integer index on `path`.
    pub fn integer(path: impl Into<String>) -> Self {
        Self::new(path, IndexType::Integer)
    }

    /// A floating index on `path`.
    pub fn floating(path: impl Into<String>) -> Self {
        Self::new(path, IndexType::Floating)
    }

    /// Parses the path of this spec.
    pub fn doc_path(&self) -> CoreResult<DocPath> {
        Ok(DocPath::parse(&self.path)?)
    }

    /// The path with `.` as its only separator.
    #[must_use]
    pub fn canonical_path(&self) -> String {
        canonical_path(&self.path)
    }

    /// Checks that the path is well formed and not engine-maintained.
    pub fn validate(&self) -> CoreResult<()> {
        self.doc_path()?;
        if [SOUP_ENTRY_ID, SOUP_CREATED_DATE, SOUP_LAST_MODIFIED_DATE].contains(&self.path.as_str())
        {
            return Err(CoreError::validation(format!(
                "{} is maintained by the store and cannot be indexed",
                self.path
            )));
        }
        Ok(())
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.index_type)
    }
}

impl FromStr for IndexSpec {
    type Err = CoreError;

    /// Parses `path:type`, e.g. `address.city:string`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, index_type) = s.rsplit_once(':').ok_or_else(|| {
            CoreError::validation(format!("index spec {s:?} must look like path:type"))
        })?;
        let spec = Self::new(path, index_type.parse()?);
        spec.validate()?;
        Ok(spec)
    }
}

/// Rewrites `path` with `.` as its only separator, so `a/b` and `a.b` compare
/// equal. Malformed paths are returned unchanged.
pub(crate) fn canonical_path(path: &str) -> String {
    DocPath::parse(path).map_or_else(|_| path.to_string(), |p| p.canonical())
}

/// Validates a full spec list: each spec, plus no path declared twice.
pub fn validate_specs(specs: &[IndexSpec]) -> CoreResult<()> {
    let mut seen = HashSet::new();
    for spec in specs {
        spec.validate()?;
        if !seen.insert(spec.canonical_path()) {
            return Err(CoreError::validation(format!(
                "path {} is indexed more than once",
                spec.path
            )));
        }
    }
    Ok(())
}

/// An index spec bound to the backing-table column that stores it.
///
/// This is the persisted form kept in the soup metadata table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    /// Indexed document path.
    pub path: String,
    /// Storage type.
    #[serde(rename = "type")]
    pub index_type: IndexType,
    /// Column name in the backing table.
    pub column: String,
}

impl IndexColumn {
    /// Returns the index spec this column stores.
    #[must_use]
    pub fn spec(&self) -> IndexSpec {
        IndexSpec::new(self.path.clone(), self.index_type)
    }
}
