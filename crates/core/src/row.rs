//! Rows and the column-alias marker grammar
//!
//! A query that selects relational data encodes the shape of the result in
//! its column aliases:
//!
//! | Suffix | Kind | Meaning |
//! |--------|------|---------|
//! | `##` | [`ColumnKind::Identity`] | part of the owning entity's identity |
//! | `[]` | [`ColumnKind::ToMany`] | segment is a one-to-many collection |
//! | `{}` | [`ColumnKind::ToOne`] | segment is a one-to-one relation |
//! | none | [`ColumnKind::Scalar`] | plain field |
//!
//! Segments are separated by dots: `posts[].comments[].id##`.
//!
//! The string suffixes are parsed once into typed tags; everything downstream
//! matches on [`ColumnKind`].

use crate::value::{Map, Value};

/// One flat record from a tabular result, keyed by column alias.
pub type Row = Map;

/// Separator between path segments in a column alias.
pub const PATH_SEPARATOR: char = '.';

/// Typed tag attached to a path segment of a column alias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Plain field
    Scalar,
    /// Identity/dedup column (`##`)
    Identity,
    /// One-to-many collection (`[]`)
    ToMany,
    /// One-to-one relation (`{}`)
    ToOne,
}

impl ColumnKind {
    /// All marker-bearing kinds
    pub const MARKED: [ColumnKind; 3] = [ColumnKind::Identity, ColumnKind::ToMany, ColumnKind::ToOne];

    /// Classify a single path segment by its suffix
    pub fn of(segment: &str) -> Self {
        split_marker(segment).1
    }

    /// The suffix that encodes this kind in an alias (empty for scalars)
    pub fn suffix(&self) -> &'static str {
        match self {
            ColumnKind::Scalar => "",
            ColumnKind::Identity => "##",
            ColumnKind::ToMany => "[]",
            ColumnKind::ToOne => "{}",
        }
    }

    fn bit(&self) -> u8 {
        match self {
            ColumnKind::Scalar => 0,
            ColumnKind::Identity => 1,
            ColumnKind::ToMany => 2,
            ColumnKind::ToOne => 4,
        }
    }
}

/// Split a segment into its bare name and its kind.
///
/// Only one trailing marker is recognized: `a##[]` is `("a##", ToMany)`.
pub fn split_marker(segment: &str) -> (&str, ColumnKind) {
    for kind in ColumnKind::MARKED {
        if let Some(bare) = segment.strip_suffix(kind.suffix()) {
            return (bare, kind);
        }
    }
    (segment, ColumnKind::Scalar)
}

/// Set of markers to strip when cleaning result keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerSet(u8);

impl MarkerSet {
    /// Every marker (`##`, `[]`, `{}`)
    pub const fn all() -> Self {
        MarkerSet(1 | 2 | 4)
    }

    /// No markers
    pub const fn none() -> Self {
        MarkerSet(0)
    }

    /// Build a set from explicit kinds
    pub fn of(kinds: &[ColumnKind]) -> Self {
        MarkerSet(kinds.iter().fold(0, |acc, k| acc | k.bit()))
    }

    /// Check whether the set contains a kind
    pub fn contains(&self, kind: ColumnKind) -> bool {
        kind != ColumnKind::Scalar && self.0 & kind.bit() != 0
    }

    /// Strip the trailing marker of `key` if it is in the set.
    ///
    /// Returns the cleaned key and the kind that was detected (whether or
    /// not it was stripped).
    pub fn strip<'a>(&self, key: &'a str) -> (&'a str, ColumnKind) {
        let (bare, kind) = split_marker(key);
        if self.contains(kind) {
            (bare, kind)
        } else {
            (key, kind)
        }
    }
}

impl Default for MarkerSet {
    fn default() -> Self {
        MarkerSet::all()
    }
}

/// A column alias split into its dotted path segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPath<'a> {
    segments: Vec<&'a str>,
}

impl<'a> ColumnPath<'a> {
    /// Split an alias on `.`
    pub fn parse(alias: &'a str) -> Self {
        ColumnPath {
            segments: alias.split(PATH_SEPARATOR).collect(),
        }
    }

    /// All segments, marker suffixes included
    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    /// Segments leading to the leaf
    pub fn parents(&self) -> &[&'a str] {
        &self.segments[..self.segments.len() - 1]
    }

    /// Final segment
    pub fn leaf(&self) -> &'a str {
        self.segments[self.segments.len() - 1]
    }

    /// Check whether any segment is a one-to-many collection
    pub fn has_collection(&self) -> bool {
        self.segments
            .iter()
            .any(|s| ColumnKind::of(s) == ColumnKind::ToMany)
    }
}

/// Check whether any alias of `row` addresses a nested path.
pub fn has_relations(row: &Row) -> bool {
    row.keys().any(|k| k.contains(PATH_SEPARATOR))
}

/// Check whether any alias of `row` contains a one-to-many marker.
pub fn has_collections(row: &Row) -> bool {
    row.keys().any(|k| k.contains(ColumnKind::ToMany.suffix()))
}

/// Build a row from `(alias, value)` pairs.
pub fn row<K, V, I>(pairs: I) -> Row
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
