//! SQL generation for soup queries.

use super::spec::{QueryKind, QuerySpec};
use crate::error::{CoreError, CoreResult};
use crate::index::{coerce, IndexType};
use crate::soup::{quote, Soup};
use crate::types::{SOUP_CREATED_DATE, SOUP_ENTRY_ID, SOUP_LAST_MODIFIED_DATE};
use soupdb_codec::{DocPath, Value};
use soupdb_storage::SqlValue;

/// A statement with its positional parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Where a path's values live.
#[derive(Debug)]
enum Target {
    /// A typed column: reserved columns or an index column.
    Column { name: String, index_type: IndexType },
    /// An unindexed path, read from the stored document.
    Json { segments: Vec<String> },
}

impl Target {
    fn resolve(soup: &Soup, path: &str) -> CoreResult<Self> {
        let reserved = match path {
            SOUP_ENTRY_ID => Some("id"),
            SOUP_CREATED_DATE => Some("created"),
            SOUP_LAST_MODIFIED_DATE => Some("lastModified"),
            _ => None,
        };
        if let Some(name) = reserved {
            return Ok(Self::Column {
                name: name.to_string(),
                index_type: IndexType::Integer,
            });
        }
        if let Some(column) = soup.column_for(path) {
            return Ok(Self::Column {
                name: quote(&column.column),
                index_type: column.index_type,
            });
        }
        Ok(Self::Json {
            segments: DocPath::parse(path)?.segments().to_vec(),
        })
    }

    /// Converts a match value into the representation stored at this target.
    fn param(&self, path: &str, value: &Value) -> CoreResult<SqlValue> {
        match self {
            Self::Column { index_type, .. } => {
                let param = coerce(value, *index_type);
                if param.is_null() {
                    return Err(CoreError::validation(format!(
                        "{} value cannot be compared with {index_type} index on {path}",
                        value.kind_name()
                    )));
                }
                Ok(param)
            }
            Self::Json { .. } => match value {
                Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
                Value::Integer(n) => Ok(SqlValue::Integer(*n)),
                Value::Float(f) => Ok(SqlValue::Real(*f)),
                Value::Text(s) => Ok(SqlValue::Text(s.clone())),
                other => Err(CoreError::validation(format!(
                    "cannot compare {path} with a {} value",
                    other.kind_name()
                ))),
            },
        }
    }
}

struct Builder {
    sql: String,
    params: Vec<SqlValue>,
}

impl Builder {
    fn new(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    fn push(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    fn bind(&mut self, value: SqlValue) {
        self.sql.push('?');
        self.params.push(value);
    }

    fn target(&mut self, target: &Target) {
        match target {
            Target::Column { name, .. } => self.push(name),
            Target::Json { segments } => self.json_value("$".to_string(), segments),
        }
    }

    /// Reads the value at `prefix` followed by `rest` out of the document.
    ///
    /// A numeric segment indexes an array and names a member of an object,
    /// so it is resolved against the type of its parent at query time.
    fn json_value(&mut self, prefix: String, rest: &[String]) {
        let Some((segment, rest)) = rest.split_first() else {
            self.push("json_extract(soup, ");
            self.bind(SqlValue::Text(prefix));
            self.push(")");
            return;
        };
        let member = format!("{prefix}.\"{segment}\"");
        match segment.parse::<usize>() {
            Ok(index) => {
                self.push("CASE json_type(soup, ");
                self.bind(SqlValue::Text(prefix.clone()));
                self.push(") WHEN 'array' THEN ");
                self.json_value(format!("{prefix}[{index}]"), rest);
                self.push(" ELSE ");
                self.json_value(member, rest);
                self.push(" END");
            }
            Err(_) => self.json_value(member, rest),
        }
    }

    fn where_clause(&mut self, soup: &Soup, kind: &QueryKind) -> CoreResult<()> {
        match kind {
            QueryKind::All => {}
            QueryKind::Exact { path, value } => {
                let target = Target::resolve(soup, path)?;
                self.push(" WHERE ");
                self.target(&target);
                if value.is_null() {
                    self.push(" IS NULL");
                } else {
                    let param = target.param(path, value)?;
                    self.push(" = ");
                    self.bind(param);
                }
            }
            QueryKind::Range { path, begin, end } => {
                let target = Target::resolve(soup, path)?;
                self.push(" WHERE ");
                match (begin, end) {
                    (None, None) => {
                        self.target(&target);
                        self.push(" IS NOT NULL");
                    }
                    _ => {
                        let mut first = true;
                        for (bound, op) in [(begin, " >= "), (end, " <= ")] {
                            let Some(bound) = bound else { continue };
                            let param = target.param(path, bound)?;
                            if !first {
                                self.push(" AND ");
                            }
                            first = false;
                            self.target(&target);
                            self.push(op);
                            self.bind(param);
                        }
                    }
                }
            }
            QueryKind::Like { path, pattern } => {
                let target = Target::resolve(soup, path)?;
                if let Target::Column { index_type, .. } = &target {
                    if *index_type != IndexType::String {
                        return Err(CoreError::validation(format!(
                            "like queries need a string index, {path} is {index_type}"
                        )));
                    }
                }
                self.push(" WHERE ");
                self.target(&target);
                self.push(" LIKE ");
                self.bind(SqlValue::Text(pattern.clone()));
            }
        }
        Ok(())
    }

    fn order_clause(&mut self, soup: &Soup, spec: &QuerySpec) -> CoreResult<()> {
        match &spec.order_path {
            Some(path) => {
                let target = Target::resolve(soup, path)?;
                self.push(" ORDER BY ");
                self.target(&target);
                self.push(" ");
                self.push(spec.order.sql());
                self.push(", id ASC");
            }
            None => self.push(" ORDER BY id ASC"),
        }
        Ok(())
    }

    fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// `SELECT soup` for one page of results.
pub(crate) fn select_page(
    soup: &Soup,
    spec: &QuerySpec,
    limit: i64,
    offset: i64,
) -> CoreResult<Statement> {
    let mut builder = Builder::new(format!("SELECT soup FROM {}", quote(&soup.table_name())));
    builder.where_clause(soup, &spec.kind)?;
    builder.order_clause(soup, spec)?;
    builder.push(" LIMIT ");
    builder.bind(SqlValue::Integer(limit));
    builder.push(" OFFSET ");
    builder.bind(SqlValue::Integer(offset));
    Ok(builder.finish())
}

/// `SELECT COUNT(*)` over everything the query matches.
pub(crate) fn count(soup: &Soup, spec: &QuerySpec) -> CoreResult<Statement> {
    let mut builder = Builder::new(format!(
        "SELECT COUNT(*) FROM {}",
        quote(&soup.table_name())
    ));
    builder.where_clause(soup, &spec.kind)?;
    Ok(builder.finish())
}

/// `SELECT id` of entries whose value at `path` equals `value`.
pub(crate) fn select_ids(
    soup: &Soup,
    path: &str,
    value: &Value,
    limit: i64,
) -> CoreResult<Statement> {
    let mut builder = Builder::new(format!("SELECT id FROM {}", quote(&soup.table_name())));
    builder.where_clause(
        soup,
        &QueryKind::Exact {
            path: path.to_string(),
            value: value.clone(),
        },
    )?;
    builder.push(" ORDER BY id ASC LIMIT ");
    builder.bind(SqlValue::Integer(limit));
    Ok(builder.finish())
}
