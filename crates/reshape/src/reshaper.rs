//! The reshaping pipeline
//!
//! ```text
//! rows ──normalize──> trees ──strip_root──> trees ──group?──> entities ──clean──> result
//! ```
//!
//! Grouping only runs when some column alias contains `[]`; pure one-to-one
//! nesting needs no deduplication. Result sets above
//! [`ReshapeConfig::specialize_threshold`] rows are normalized and cleaned
//! through cached shape plans instead of the generic walkers.

use crate::clean::clean;
use crate::group::{group, is_group, is_identity_key};
use crate::normalize::{normalize, strip_root};
use crate::plan::{CleanPlan, PlanCache};
use once_cell::sync::Lazy;
use rowgraph_core::{has_collections, has_relations, MarkerSet, Row, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Reshaper tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReshapeConfig {
    /// Result sets with more rows than this use shape plans
    pub specialize_threshold: usize,
    /// Maximum number of cached shape plans (0 disables caching)
    pub plan_cache_capacity: usize,
}

impl Default for ReshapeConfig {
    fn default() -> Self {
        ReshapeConfig {
            specialize_threshold: 4,
            plan_cache_capacity: 64,
        }
    }
}

/// Converts flat marker-keyed rows into a nested, deduplicated forest
///
/// Cloning is cheap; clones share the plan cache.
#[derive(Debug, Clone)]
pub struct Reshaper {
    config: ReshapeConfig,
    plans: Arc<PlanCache>,
}

impl Reshaper {
    /// Create a reshaper with default settings
    pub fn new() -> Self {
        Self::with_config(ReshapeConfig::default())
    }

    /// Create a reshaper with explicit settings
    pub fn with_config(config: ReshapeConfig) -> Self {
        let plans = Arc::new(PlanCache::new(config.plan_cache_capacity));
        Reshaper { config, plans }
    }

    /// Current settings
    pub fn config(&self) -> &ReshapeConfig {
        &self.config
    }

    /// Shape plan cache shared by this reshaper and its clones
    pub fn plans(&self) -> &PlanCache {
        &self.plans
    }

    /// Reshape one result set.
    ///
    /// Rows must all expose the same column aliases; divergent shapes give
    /// unspecified nesting.
    pub fn process(&self, rows: Vec<Row>) -> Vec<Value> {
        let first = match rows.first() {
            Some(first) => first,
            None => return Vec::new(),
        };
        if !has_relations(first) {
            return rows.into_iter().map(Value::Object).collect();
        }

        let collections = has_collections(first);
        let specialize = rows.len() > self.config.specialize_threshold;

        let normalized: Vec<Value> = if specialize {
            let plan = self.plans.plan_for(first);
            rows.into_iter().map(|row| plan.normalize(row)).collect()
        } else {
            rows.into_iter().map(normalize).collect()
        };
        let normalized = strip_root(normalized);

        let markers = MarkerSet::all();
        if collections {
            return group(normalized, is_group, is_identity_key)
                .into_iter()
                .map(|entity| clean(entity, &markers))
                .collect();
        }

        if specialize {
            let cleaner = match normalized.first() {
                Some(first) => CleanPlan::compile(first, markers),
                None => return normalized,
            };
            normalized.into_iter().map(|row| cleaner.apply(row)).collect()
        } else {
            normalized.into_iter().map(|row| clean(row, &markers)).collect()
        }
    }
}

impl Default for Reshaper {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_RESHAPER: Lazy<Reshaper> = Lazy::new(Reshaper::new);

/// Reshape a result set with the shared default [`Reshaper`].
pub fn process(rows: Vec<Row>) -> Vec<Value> {
    DEFAULT_RESHAPER.process(rows)
}
