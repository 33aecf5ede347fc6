//! Grouping of normalized rows into deduplicated entities
//!
//! ## Algorithm
//!
//! ```text
//! 1. Partition the first row's keys into group keys (nested sub-rows),
//!    identity keys and other keys. No identity keys => all other keys are
//!    the identity (full scalar equality).
//! 2. For every row, find or create the bucket for its identity tuple and
//!    append each group key's sub-row to that bucket's sequence.
//! 3. For every bucket and group key: an all-null sequence becomes [],
//!    anything else is grouped recursively.
//! ```
//!
//! Buckets are kept in first-encountered order.
//!
//! One-to-one relations (group keys not marked `[]`) are collapsed to their
//! single entity, or `Null` when no related row exists, as soon as their
//! sequence has been grouped.

use indexmap::map::Entry;
use indexmap::IndexMap;
use rowgraph_core::{ColumnKind, Map, Value};
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::hash::BuildHasherDefault;

/// Identity tuple of a bucket.
///
/// Values are compared by type and content, so `1` and `"1"` never share a
/// bucket.
type BucketKey = SmallVec<[Value; 2]>;

type Buckets = IndexMap<BucketKey, Map, BuildHasherDefault<FxHasher>>;

/// Predicate deciding whether a row property is a group or an identity key
pub type KeyPredicate<'a> = &'a dyn Fn(&str, &Value) -> bool;

/// Group predicate: the value is a normalized sub-row (non-empty object).
pub fn is_group(_key: &str, value: &Value) -> bool {
    value.is_non_empty_object()
}

/// Identity predicate: the key carries the `##` marker.
pub fn is_identity_key(key: &str, _value: &Value) -> bool {
    ColumnKind::of(key) == ColumnKind::Identity
}

/// Check whether a value carries no data at all.
///
/// `Null`, and arrays or objects whose every leaf is `Null` (including empty
/// ones), are deep-null.
pub fn is_deep_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().all(is_deep_null),
        Value::Object(fields) => fields.values().all(is_deep_null),
        _ => false,
    }
}

/// Key partition computed once per grouping level from the first row
#[derive(Debug)]
struct KeyLayout {
    group: Vec<(String, ColumnKind)>,
    identity: Vec<String>,
}

impl KeyLayout {
    fn from_row(row: &Map, is_group: KeyPredicate<'_>, is_identity: KeyPredicate<'_>) -> Self {
        let mut group = Vec::new();
        let mut identity = Vec::new();
        let mut other = Vec::new();

        for (key, value) in row {
            if is_group(key, value) {
                group.push((key.clone(), ColumnKind::of(key)));
            } else if is_identity(key, value) {
                identity.push(key.clone());
            } else {
                other.push(key.clone());
            }
        }

        // Implementation-defined fallback: dedup on every scalar field
        if identity.is_empty() {
            identity = other;
        }

        KeyLayout { group, identity }
    }

    fn is_group_key(&self, key: &str) -> bool {
        self.group.iter().any(|(k, _)| k == key)
    }

    fn bucket_key(&self, row: &Map) -> BucketKey {
        self.identity
            .iter()
            .map(|k| row.get(k).cloned().unwrap_or(Value::Null))
            .collect()
    }

    fn new_bucket(&self, row: &Map) -> Map {
        row.iter()
            .map(|(key, value)| {
                if self.is_group_key(key) {
                    (key.clone(), Value::Array(Vec::new()))
                } else {
                    (key.clone(), value.clone())
                }
            })
            .collect()
    }
}

/// Group normalized rows into entities.
///
/// `is_group` and `is_identity` receive `(key, value)` of each top-level
/// property of the first row; see [`is_group`] and [`is_identity_key`] for
/// the predicates used by the reshaper.
///
/// Only `[]` group keys come back as arrays. Every other group key (`{}` or
/// unmarked) already holds its single entity, or `Null` when no related row
/// exists, so a later [`clean`](crate::clean()) only strips markers.
pub fn group<G, I>(rows: Vec<Value>, is_group: G, is_identity: I) -> Vec<Value>
where
    G: Fn(&str, &Value) -> bool,
    I: Fn(&str, &Value) -> bool,
{
    group_level(rows, &is_group, &is_identity)
}

fn group_level(
    rows: Vec<Value>,
    is_group: KeyPredicate<'_>,
    is_identity: KeyPredicate<'_>,
) -> Vec<Value> {
    let layout = match rows.first().and_then(Value::as_object) {
        Some(first) => KeyLayout::from_row(first, is_group, is_identity),
        None => return rows,
    };

    let mut buckets = Buckets::default();
    for row in rows {
        let mut row = row.into_object().unwrap_or_default();
        let bucket = match buckets.entry(layout.bucket_key(&row)) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(layout.new_bucket(&row)),
        };
        for (key, _) in &layout.group {
            let sub_row = row.shift_remove(key).unwrap_or(Value::Null);
            if let Some(Value::Array(seq)) = bucket.get_mut(key) {
                seq.push(sub_row);
            }
        }
    }

    buckets
        .into_values()
        .map(|mut fields| {
            for (key, kind) in &layout.group {
                if let Some(slot) = fields.get_mut(key) {
                    let seq = std::mem::take(slot).into_array().unwrap_or_default();
                    *slot = finish_relation(seq, *kind, is_group, is_identity);
                }
            }
            Value::Object(fields)
        })
        .collect()
}

fn finish_relation(
    seq: Vec<Value>,
    kind: ColumnKind,
    is_group: KeyPredicate<'_>,
    is_identity: KeyPredicate<'_>,
) -> Value {
    let entities = if seq.iter().all(is_deep_null) {
        Vec::new()
    } else {
        group_level(seq, is_group, is_identity)
    };

    match kind {
        ColumnKind::ToMany => Value::Array(entities),
        _ => entities.into_iter().next().unwrap_or(Value::Null),
    }
}
