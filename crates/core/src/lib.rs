//! Core types for rowgraph
//!
//! This crate defines the vocabulary shared by every other crate:
//! - [`Value`]: dynamic value carried by rows and results
//! - [`Row`] and [`ColumnKind`]: flat records and the alias marker grammar
//! - [`Query`]: `{text, values}` statement descriptor
//! - [`Error`]: the single error type
//! - [`Executor`], [`Driver`], [`Transaction`]: consumed backend capabilities

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod query;
pub mod row;
pub mod traits;
pub mod value;

pub use error::{Error, Result};
pub use query::Query;
pub use row::{has_collections, has_relations, row, split_marker, ColumnKind, ColumnPath, MarkerSet, Row};
pub use traits::{Driver, DriverExecutor, Executor, Transaction};
pub use value::{Map, Value};
