//! Row normalization
//!
//! Turns a flat row keyed by dotted aliases into a tree. Intermediate nodes
//! are path segments; leaves keep their marker-bearing names so that later
//! passes can still see `##`, `[]` and `{}`.
//!
//! ```text
//! {"id##": 1, "posts[].id": 7}  =>  {"id##": 1, "posts[]": {"id": 7}}
//! ```

use rowgraph_core::{ColumnPath, Map, Row, Value};

/// Normalize one row into a nested object.
///
/// Values are moved, never copied or coerced. If a path segment collides
/// with a scalar assigned earlier, the scalar is replaced by an object.
pub fn normalize(row: Row) -> Value {
    let mut root = Map::with_capacity(row.len());
    for (alias, value) in row {
        let path = ColumnPath::parse(&alias);
        let mut obj = &mut root;
        for segment in path.parents() {
            obj = descend(obj, segment);
        }
        obj.insert(path.leaf().to_string(), value);
    }
    Value::Object(root)
}

fn descend<'m>(obj: &'m mut Map, segment: &str) -> &'m mut Map {
    let slot = obj
        .entry(segment.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !matches!(slot, Value::Object(_)) {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(o) => o,
        _ => unreachable!("slot holds an object"),
    }
}

/// Remove artificial wrapping levels.
///
/// While the first row has exactly one property and that property is a
/// non-empty object, every row is replaced by the value under that key.
/// This undoes the extra level produced by selecting everything through a
/// single named root alias such as `users.*`.
pub fn strip_root(mut rows: Vec<Value>) -> Vec<Value> {
    while let Some(key) = removable_root(&rows) {
        rows = rows
            .into_iter()
            .map(|row| match row {
                Value::Object(mut o) => o.shift_remove(&key).unwrap_or(Value::Null),
                _ => Value::Null,
            })
            .collect();
    }
    rows
}

fn removable_root(rows: &[Value]) -> Option<String> {
    let first = rows.first()?.as_object()?;
    if first.len() != 1 {
        return None;
    }
    let (key, value) = first.get_index(0)?;
    value.is_non_empty_object().then(|| key.clone())
}
