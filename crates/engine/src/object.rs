//! Keyed result maps
//!
//! [`collect_object`] turns a result set into a map from one column's value
//! to a per-row value chosen by an [`ObjectMapper`]. A later row with the same
//! key replaces the earlier value but keeps its position.

use indexmap::IndexMap;
use rowgraph_core::{Map, Value};
use std::fmt;

/// Result of [`Database::all_object`](crate::Database::all_object)
pub type ObjectMap = IndexMap<String, Value>;

/// How each row becomes a map value
pub enum ObjectMapper {
    /// The value of one column
    Column(String),
    /// An object holding the listed columns, in list order
    Columns(Vec<String>),
    /// Caller-supplied projection
    Function(Box<dyn Fn(&Value) -> Value + Send + Sync>),
    /// Every column except the key: none gives `Null`, one gives its value,
    /// more give an object
    Default,
}

impl ObjectMapper {
    /// Mapper taking one column
    pub fn column(name: impl Into<String>) -> Self {
        ObjectMapper::Column(name.into())
    }

    /// Mapper selecting several columns
    pub fn columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ObjectMapper::Columns(names.into_iter().map(Into::into).collect())
    }

    /// Mapper running `f` on each row
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        ObjectMapper::Function(Box::new(f))
    }

    fn apply(&self, key_column: &str, row: &Value) -> Value {
        match self {
            ObjectMapper::Column(name) => row.get(name).cloned().unwrap_or(Value::Null),
            ObjectMapper::Columns(names) => Value::Object(
                names
                    .iter()
                    .map(|n| (n.clone(), row.get(n).cloned().unwrap_or(Value::Null)))
                    .collect(),
            ),
            ObjectMapper::Function(f) => f(row),
            ObjectMapper::Default => {
                let rest: Map = match row.as_object() {
                    Some(fields) => fields
                        .iter()
                        .filter(|(k, _)| k.as_str() != key_column)
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                    None => return Value::Null,
                };
                match rest.len() {
                    0 => Value::Null,
                    1 => rest.into_iter().next().map_or(Value::Null, |(_, v)| v),
                    _ => Value::Object(rest),
                }
            }
        }
    }
}

impl Default for ObjectMapper {
    fn default() -> Self {
        ObjectMapper::Default
    }
}

impl fmt::Debug for ObjectMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectMapper::Column(name) => f.debug_tuple("Column").field(name).finish(),
            ObjectMapper::Columns(names) => f.debug_tuple("Columns").field(names).finish(),
            ObjectMapper::Function(_) => f.write_str("Function(..)"),
            ObjectMapper::Default => f.write_str("Default"),
        }
    }
}

/// Build the keyed map for `rows`.
///
/// Rows rejected by `filter` are skipped. Keys are the key column rendered
/// with [`Value::to_key_string`]; a missing key column renders as `null`.
pub fn collect_object(
    rows: &[Value],
    key_column: &str,
    mapper: &ObjectMapper,
    filter: Option<&dyn Fn(&Value) -> bool>,
) -> ObjectMap {
    let mut out = ObjectMap::with_capacity(rows.len());
    for row in rows {
        if let Some(keep) = filter {
            if !keep(row) {
                continue;
            }
        }
        let key = row
            .get(key_column)
            .map_or_else(|| Value::Null.to_key_string(), Value::to_key_string);
        out.insert(key, mapper.apply(key_column, row));
    }
    out
}
