use crate::error::{CoreError, CoreResult};
use soupdb_codec::{DocPath, Value};
use std::cmp::Ordering;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortOrder {
    pub(crate) const fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

/// What a query matches.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryKind {
    /// Every entry of the soup.
    All,
    /// Entries whose value at `path` equals `value`. A null value matches
    /// entries where the path is absent or null.
    Exact {
        /// Document path.
        path: String,
        /// Value to match.
        value: Value,
    },
    /// Entries whose value at `path` lies in `[begin, end]`. Either bound may
    /// be omitted.
    Range {
        /// Document path.
        path: String,
        /// Inclusive lower bound.
        begin: Option<Value>,
        /// Inclusive upper bound.
        end: Option<Value>,
    },
    /// Entries whose value at `path` matches an SQL `LIKE` pattern
    /// (`%` any run, `_` one character).
    Like {
        /// Document path.
        path: String,
        /// `LIKE` pattern.
        pattern: String,
    },
}

/// A query against one soup.
///
/// ```rust
/// use soupdb_core::{QuerySpec, SortOrder};
///
/// let spec = QuerySpec::range("age", Some(30.into()), None, 20)
///     .order_by("lastName", SortOrder::Descending);
/// assert!(spec.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// The predicate.
    pub kind: QueryKind,
    /// Path to sort by. Entries are sorted by entry id when absent.
    pub order_path: Option<String>,
    /// Sort direction for `order_path`.
    pub order: SortOrder,
    /// Entries per page, at least 1.
    pub page_size: usize,
}

impl QuerySpec {
    fn new(kind: QueryKind, page_size: usize) -> Self {
        Self {
            kind,
            order_path: None,
            order: SortOrder::Ascending,
            page_size,
        }
    }

    /// Matches every entry.
    pub fn all(page_size: usize) -> Self {
        Self::new(QueryKind::All, page_size)
    }

    /// Matches entries whose value at `path` equals `value`.
    pub fn exact(path: impl Into<String>, value: impl Into<Value>, page_size: usize) -> Self {
        Self::new(
            QueryKind::Exact {
                path: path.into(),
                value: value.into(),
            },
            page_size,
        )
    }

    /// Matches entries whose value at `path` lies between the bounds.
    pub fn range(
        path: impl Into<String>,
        begin: Option<Value>,
        end: Option<Value>,
        page_size: usize,
    ) -> Self {
        Self::new(
            QueryKind::Range {
                path: path.into(),
                begin,
                end,
            },
            page_size,
        )
    }

    /// Matches entries whose value at `path` is `LIKE` the pattern.
    pub fn like(path: impl Into<String>, pattern: impl Into<String>, page_size: usize) -> Self {
        Self::new(
            QueryKind::Like {
                path: path.into(),
                pattern: pattern.into(),
            },
            page_size,
        )
    }

    /// Sorts results by `path`.
    #[must_use]
    pub fn order_by(mut self, path: impl Into<String>, order: SortOrder) -> Self {
        self.order_path = Some(path.into());
        self.order = order;
        self
    }

    /// The path the predicate looks at, if any.
    pub fn target_path(&self) -> Option<&str> {
        match &self.kind {
            QueryKind::All => None,
            QueryKind::Exact { path, .. }
            | QueryKind::Range { path, .. }
            | QueryKind::Like { path, .. } => Some(path),
        }
    }

    /// Checks the query for structural errors.
    ///
    /// # Errors
    ///
    /// `Validation` for a zero page size, malformed paths, non-scalar match
    /// values, or a range whose lower bound exceeds its upper bound.
    pub fn validate(&self) -> CoreResult<()> {
        if self.page_size == 0 {
            return Err(CoreError::validation("page size must be at least 1"));
        }
        if let Some(path) = self.target_path() {
            DocPath::parse(path)?;
        }
        if let Some(path) = &self.order_path {
            DocPath::parse(path)?;
        }

        match &self.kind {
            QueryKind::All | QueryKind::Like { .. } => {}
            QueryKind::Exact { value, .. } => {
                if !value.is_scalar() && !value.is_null() {
                    return Err(CoreError::validation(format!(
                        "cannot match on a {} value",
                        value.kind_name()
                    )));
                }
            }
            QueryKind::Range { begin, end, .. } => {
                for bound in [begin, end].into_iter().flatten() {
                    if !bound.is_scalar() {
                        return Err(CoreError::validation(format!(
                            "range bound cannot be a {} value",
                            bound.kind_name()
                        )));
                    }
                }
                if let (Some(begin), Some(end)) = (begin, end) {
                    match begin.compare_scalar(end) {
                        Some(Ordering::Greater) => {
                            return Err(CoreError::validation(
                                "range lower bound is greater than upper bound",
                            ))
                        }
                        None => {
                            return Err(CoreError::validation(format!(
                                "range bounds {} and {} are not comparable",
                                begin.kind_name(),
                                end.kind_name()
                            )))
                        }
                        Some(_) => {}
                    }
                }
            }
        }
        Ok(())
    }

    /// Builds a spec from its dictionary form.
    ///
    /// Recognised keys: `queryType` (`all`, `exact`, `range`, `like`),
    /// `indexPath`, `matchKey`, `beginKey`, `endKey`, `likeKey`, `orderPath`,
    /// `order` (`ascending`, `descending`) and `pageSize`. When `order` is
    /// given without `orderPath`, results are sorted by `indexPath`.
    pub fn from_value(dict: &Value, default_page_size: usize) -> CoreResult<Self> {
        if dict.as_map().is_none() {
            return Err(CoreError::validation("query spec must be an object"));
        }

        let text = |key: &str| -> CoreResult<Option<String>> {
            match dict.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::Text(s)) => Ok(Some(s.clone())),
                Some(other) => Err(CoreError::validation(format!(
                    "{key} must be a string, got {}",
                    other.kind_name()
                ))),
            }
        };
        let index_path = || {
            text("indexPath")?
                .ok_or_else(|| CoreError::validation("indexPath is required for this query type"))
        };
        let bound = |key: &str| dict.get(key).filter(|v| !v.is_null()).cloned();

        let page_size = match dict.get("pageSize") {
            None | Some(Value::Null) => default_page_size,
            Some(v) => v
                .as_integer()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| CoreError::validation("pageSize must be a positive integer"))?,
        };

        let query_type = text("queryType")?.unwrap_or_else(|| "all".to_string());
        let kind = match query_type.as_str() {
            "all" => QueryKind::All,
            "exact" => QueryKind::Exact {
                path: index_path()?,
                value: dict.get("matchKey").cloned().unwrap_or(Value::Null),
            },
            "range" => QueryKind::Range {
                path: index_path()?,
                begin: bound("beginKey"),
                end: bound("endKey"),
            },
            "like" => QueryKind::Like {
                path: index_path()?,
                pattern: text("likeKey")?
                    .ok_or_else(|| CoreError::validation("likeKey is required for like queries"))?,
            },
            other => {
                return Err(CoreError::validation(format!(
                    "unknown queryType {other:?}"
                )))
            }
        };

        let order = match text("order")?.as_deref() {
            None => None,
            Some("ascending") => Some(SortOrder::Ascending),
            Some("descending") => Some(SortOrder::Descending),
            Some(other) => {
                return Err(CoreError::validation(format!("unknown order {other:?}")))
            }
        };

        let mut spec = Self::new(kind, page_size);
        let order_path = text("orderPath")?.or_else(|| {
            order
                .is_some()
                .then(|| spec.target_path().map(str::to_string))
                .flatten()
        });
        spec.order_path = order_path;
        spec.order = order.unwrap_or_default();
        spec.validate()?;
        Ok(spec)
    }

    /// Dictionary form of this spec, as accepted by [`QuerySpec::from_value`].
    pub fn to_value(&self) -> Value {
        let page_size = i64::try_from(self.page_size).unwrap_or(i64::MAX);
        let mut dict = Value::map([("pageSize", Value::Integer(page_size))]);
        match &self.kind {
            QueryKind::All => {
                dict.insert("queryType", "all".into());
            }
            QueryKind::Exact { path, value } => {
                dict.insert("queryType", "exact".into());
                dict.insert("indexPath", path.as_str().into());
                dict.insert("matchKey", value.clone());
            }
            QueryKind::Range { path, begin, end } => {
                dict.insert("queryType", "range".into());
                dict.insert("indexPath", path.as_str().into());
                if let Some(begin) = begin {
                    dict.insert("beginKey", begin.clone());
                }
                if let Some(end) = end {
                    dict.insert("endKey", end.clone());
                }
            }
            QueryKind::Like { path, pattern } => {
                dict.insert("queryType", "like".into());
                dict.insert("indexPath", path.as_str().into());
                dict.insert("likeKey", pattern.as_str().into());
            }
        }
        if let Some(path) = &self.order_path {
            dict.insert("orderPath", path.as_str().into());
            dict.insert("order", self.order.as_str().into());
        }
        dict
    }
}
