//! # rowgraph
//!
//! Reshapes flat relational rows into nested object graphs, and composes
//! dependent queries before a transaction exists.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rowgraph::prelude::*;
//!
//! let db = Database::builder().driver(driver).build()?;
//!
//! // Column aliases describe the result shape
//! let users = db.exec(&Query::text(
//!     "SELECT u.id AS \"id##\", u.name AS name, \
//!             p.id AS \"posts[].id##\", p.title AS \"posts[].title\" \
//!      FROM users u LEFT JOIN posts p ON p.author = u.id",
//! ))?;
//!
//! // Deferred, transactional composition
//! let node = db
//!     .deferred(Query::text("INSERT INTO users (name) VALUES (?)").bind("ann"))
//!     .chain(|_| Ok(TxMonad::query("SELECT last_insert_rowid() AS id")));
//! let inserted = db.run(node)?;
//! ```
//!
//! ## Column markers
//!
//! | Suffix | Meaning |
//! |--------|---------|
//! | `##`   | identity column used for deduplication |
//! | `[]`   | one-to-many relation, becomes an array |
//! | `{}`   | one-to-one relation, becomes an object or `null` |
//!
//! Path segments are separated by `.`.
//!
//! ## Crates
//!
//! - [`reshape`]: the reshaping pipeline
//! - [`txmonad`]: deferred transaction composition
//! - [`engine`]: [`Database`] over a [`Driver`]

#![warn(missing_docs)]

pub mod prelude;

pub use rowgraph_engine as engine;
pub use rowgraph_reshape as reshape;
pub use rowgraph_txmonad as txmonad;

// Re-export main entry points
pub use rowgraph_core::{
    has_collections, has_relations, row, split_marker, ColumnKind, ColumnPath, Driver,
    DriverExecutor, Error, Executor, Map, MarkerSet, Query, Result, Row, Transaction, Value,
};
pub use rowgraph_engine::{Database, DatabaseBuilder, EngineConfig, ObjectMap, ObjectMapper};
pub use rowgraph_reshape::{process, ReshapeConfig, Reshaper};
pub use rowgraph_txmonad::{Next, NodeId, NodeState, RunTrace, TxMonad};

#[cfg(feature = "sqlite")]
pub use rowgraph_engine::SqliteDriver;
