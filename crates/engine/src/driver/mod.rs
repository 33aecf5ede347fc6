//! Reference drivers
//!
//! rowgraph only consumes the [`Driver`](rowgraph_core::Driver) capability;
//! drivers for specific backends live behind features.

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDriver, SqliteTransaction};
