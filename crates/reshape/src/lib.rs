//! Relational result reshaping for rowgraph
//!
//! Converts the flat rows of a joined query into nested entities. Column
//! aliases describe the target shape (see [`rowgraph_core::ColumnKind`]):
//!
//! ```text
//! id##  posts[].id  posts[].content
//! 1     1           a
//! 1     2           b
//!
//! => [{ id: 1, posts: [{ id: 1, content: "a" }, { id: 2, content: "b" }] }]
//! ```
//!
//! The pipeline is exposed piece by piece ([`normalize`], [`strip_root`],
//! [`group`], [`clean`]) and as a whole ([`process`], [`Reshaper`]).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clean;
pub mod group;
pub mod normalize;
pub mod plan;
pub mod reshaper;

pub use clean::clean;
pub use group::{group, is_deep_null, is_group, is_identity_key};
pub use normalize::{normalize, strip_root};
pub use plan::{CleanPlan, PlanCache, ShapePlan};
pub use reshaper::{process, ReshapeConfig, Reshaper};
