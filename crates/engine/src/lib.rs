//! Database front end for rowgraph
//!
//! This crate ties the pieces together:
//! - [`Database`]: executes statements through a [`Driver`](rowgraph_core::Driver),
//!   annotates failures with the statement, and reshapes every result set
//! - transaction helpers: [`Database::transaction`] and [`Database::run`]
//!   for deferred [`TxMonad`](rowgraph_txmonad::TxMonad) chains
//! - [`EngineConfig`]: TOML-loadable settings
//! - [`driver`]: reference drivers (SQLite behind the `sqlite` feature)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod database;
pub mod driver;
pub mod object;

pub use config::EngineConfig;
pub use database::{Database, DatabaseBuilder};
pub use object::{collect_object, ObjectMap, ObjectMapper};

#[cfg(feature = "sqlite")]
pub use driver::{SqliteDriver, SqliteTransaction};
