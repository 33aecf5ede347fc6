//! Convenient imports for rowgraph.
//!
//! ```ignore
//! use rowgraph::prelude::*;
//!
//! let db = Database::new(driver);
//! let rows = db.exec(&Query::text("SELECT 1 AS one"))?;
//! ```

// Main entry point
pub use crate::engine::{Database, DatabaseBuilder, EngineConfig, ObjectMapper};

// Error handling
pub use crate::{Error, Result};

// Core types
pub use crate::{Driver, Executor, Query, Row, Transaction, Value};

// Composition
pub use crate::txmonad::{Next, TxMonad};

// Reshaping
pub use crate::reshape::{process, Reshaper};

#[cfg(feature = "sqlite")]
pub use crate::engine::SqliteDriver;
