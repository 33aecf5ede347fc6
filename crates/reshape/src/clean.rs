//! Marker removal
//!
//! `clean` rewrites every key of a result tree by stripping one trailing
//! marker from the given [`MarkerSet`]. A `{}` key holding an array (the
//! grouping representation of a one-to-one relation) is replaced by the
//! array's first element, or `Null` when the array is empty.

use rowgraph_core::{ColumnKind, Map, MarkerSet, Value};

/// Strip markers from every key of `tree`, recursively.
///
/// Scalars pass through unchanged; arrays are cleaned element-wise.
/// Cleaning is idempotent for trees whose keys carry at most one marker.
pub fn clean(tree: Value, markers: &MarkerSet) -> Value {
    match tree {
        Value::Array(items) => Value::Array(items.into_iter().map(|v| clean(v, markers)).collect()),
        Value::Object(fields) => Value::Object(clean_fields(fields, markers)),
        scalar => scalar,
    }
}

fn clean_fields(fields: Map, markers: &MarkerSet) -> Map {
    let mut cleaned = Map::with_capacity(fields.len());
    for (key, value) in fields {
        let (bare, kind) = markers.strip(&key);
        let value = clean_value(value, kind, markers);
        cleaned.insert(bare.to_string(), value);
    }
    cleaned
}

/// Clean one property value given the kind detected on its key.
pub(crate) fn clean_value(value: Value, kind: ColumnKind, markers: &MarkerSet) -> Value {
    match value {
        Value::Array(items) if kind == ColumnKind::ToOne => {
            items.into_iter().next().map_or(Value::Null, |v| clean(v, markers))
        }
        nested @ (Value::Array(_) | Value::Object(_)) => clean(nested, markers),
        scalar => scalar,
    }
}
