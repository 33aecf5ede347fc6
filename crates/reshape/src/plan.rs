//! Shape plans for large result sets
//!
//! Every row of one result set exposes the same column aliases, so the
//! nesting work done by [`normalize`](crate::normalize) and
//! [`clean`](crate::clean) is identical for each of them. A plan computes it
//! once from the first row:
//!
//! - [`ShapePlan`] moves each column straight into its place in the tree,
//!   without splitting aliases per row.
//! - [`CleanPlan`] maps each (nested) key to its stripped name.
//!
//! Plans are only worth building above a few rows; see
//! [`ReshapeConfig::specialize_threshold`](crate::ReshapeConfig).

use crate::clean::{clean, clean_value};
use crate::normalize::normalize;
use dashmap::DashMap;
use rowgraph_core::{ColumnKind, Map, MarkerSet, Row, Value};
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum PlanNode {
    Leaf { name: String, alias: String },
    Branch { name: String, children: Vec<PlanNode> },
}

/// Precomputed normalizer for one column set
#[derive(Debug, Clone, PartialEq)]
pub struct ShapePlan {
    nodes: Vec<PlanNode>,
    columns: usize,
}

impl ShapePlan {
    /// Analyse the shape of `row`.
    ///
    /// The skeleton is produced by the generic normalizer itself (each leaf
    /// holds its alias), so both paths agree on every nesting decision.
    pub fn compile(row: &Row) -> Self {
        let skeleton: Row = row
            .keys()
            .map(|alias| (alias.clone(), Value::String(alias.clone())))
            .collect();
        let nodes = match normalize(skeleton) {
            Value::Object(tree) => plan_nodes(tree),
            _ => Vec::new(),
        };
        ShapePlan {
            nodes,
            columns: row.len(),
        }
    }

    /// Number of columns the plan was compiled for
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Normalize a row following the plan.
    ///
    /// Columns missing from `row` become `Null`.
    pub fn normalize(&self, mut row: Row) -> Value {
        Value::Object(build(&self.nodes, &mut row))
    }
}

fn plan_nodes(tree: Map) -> Vec<PlanNode> {
    tree.into_iter()
        .filter_map(|(name, value)| match value {
            Value::String(alias) => Some(PlanNode::Leaf { name, alias }),
            Value::Object(children) => Some(PlanNode::Branch {
                name,
                children: plan_nodes(children),
            }),
            _ => None,
        })
        .collect()
}

fn build(nodes: &[PlanNode], row: &mut Row) -> Map {
    let mut out = Map::with_capacity(nodes.len());
    for node in nodes {
        match node {
            PlanNode::Leaf { name, alias } => {
                out.insert(name.clone(), row.swap_remove(alias).unwrap_or(Value::Null));
            }
            PlanNode::Branch { name, children } => {
                out.insert(name.clone(), Value::Object(build(children, row)));
            }
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
struct CleanNode {
    from: String,
    to: String,
    kind: ColumnKind,
    children: Option<Vec<CleanNode>>,
}

/// Precomputed key cleaner for rows that need no grouping
#[derive(Debug, Clone, PartialEq)]
pub struct CleanPlan {
    nodes: Vec<CleanNode>,
    markers: MarkerSet,
}

impl CleanPlan {
    /// Build a cleaner from the first normalized row.
    pub fn compile(row: &Value, markers: MarkerSet) -> Self {
        let nodes = row.as_object().map(|o| clean_nodes(o, &markers)).unwrap_or_default();
        CleanPlan { nodes, markers }
    }

    /// Clean one normalized row.
    ///
    /// Values that do not match the planned shape fall back to the generic
    /// cleaner.
    pub fn apply(&self, row: Value) -> Value {
        match row {
            Value::Object(mut fields) => Value::Object(self.apply_nodes(&self.nodes, &mut fields)),
            other => clean(other, &self.markers),
        }
    }

    fn apply_nodes(&self, nodes: &[CleanNode], fields: &mut Map) -> Map {
        let mut out = Map::with_capacity(nodes.len());
        for node in nodes {
            let value = fields.swap_remove(&node.from).unwrap_or(Value::Null);
            let value = match (&node.children, value) {
                (Some(children), Value::Object(mut nested)) => {
                    Value::Object(self.apply_nodes(children, &mut nested))
                }
                (_, value) => clean_value(value, node.kind, &self.markers),
            };
            out.insert(node.to.clone(), value);
        }
        out
    }
}

fn clean_nodes(fields: &Map, markers: &MarkerSet) -> Vec<CleanNode> {
    fields
        .iter()
        .map(|(key, value)| {
            let (bare, kind) = markers.strip(key);
            let children = match value {
                Value::Object(nested) if !nested.is_empty() => Some(clean_nodes(nested, markers)),
                _ => None,
            };
            CleanNode {
                from: key.clone(),
                to: bare.to_string(),
                kind,
                children,
            }
        })
        .collect()
}

/// Column-alias signature identifying a row shape
pub type ShapeKey = Vec<String>;

/// Bounded concurrent cache of compiled shape plans
#[derive(Debug)]
pub struct PlanCache {
    plans: DashMap<ShapeKey, Arc<ShapePlan>, BuildHasherDefault<FxHasher>>,
    capacity: usize,
}

impl PlanCache {
    /// Create a cache holding at most `capacity` plans (0 disables caching)
    pub fn new(capacity: usize) -> Self {
        PlanCache {
            plans: DashMap::default(),
            capacity,
        }
    }

    /// Get the plan for `row`'s shape, compiling it on first use
    pub fn plan_for(&self, row: &Row) -> Arc<ShapePlan> {
        if self.capacity == 0 {
            return Arc::new(ShapePlan::compile(row));
        }

        let key: ShapeKey = row.keys().cloned().collect();
        if let Some(plan) = self.plans.get(&key) {
            tracing::trace!(columns = key.len(), "shape plan cache hit");
            return Arc::clone(plan.value());
        }

        let plan = Arc::new(ShapePlan::compile(row));
        tracing::trace!(columns = key.len(), "compiled shape plan");

        if self.plans.len() >= self.capacity {
            self.plans.clear();
        }
        self.plans.insert(key, Arc::clone(&plan));
        plan
    }

    /// Number of cached plans
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Check whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Drop every cached plan
    pub fn clear(&self) {
        self.plans.clear();
    }
}
