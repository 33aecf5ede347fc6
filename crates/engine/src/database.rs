//! Main database entry point for rowgraph.
//!
//! [`Database`] wraps a [`Driver`] and runs every result set through the
//! [`Reshaper`]. Statements can run directly on the pool, inside a
//! transaction handle, or be deferred into a [`TxMonad`] and run later.
//!
//! # Example
//!
//! ```ignore
//! use rowgraph::prelude::*;
//!
//! let db = Database::builder().driver(my_driver).build()?;
//!
//! let users = db.exec(&Query::text(
//!     "SELECT u.id AS \"id##\", p.id AS \"posts[].id##\" FROM users u LEFT JOIN posts p ON p.user_id = u.id",
//! ))?;
//!
//! let total = db.run(
//!     db.deferred("INSERT INTO log (msg) VALUES ('a')")
//!         .chain(|_| Ok(TxMonad::query("SELECT count(*) AS n FROM log"))),
//! )?;
//! ```

use crate::config::EngineConfig;
use crate::object::{collect_object, ObjectMap, ObjectMapper};
use rowgraph_core::{Driver, DriverExecutor, Error, Executor, Query, Result, Row, Transaction, Value};
use rowgraph_reshape::Reshaper;
use rowgraph_txmonad::TxMonad;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reshaping front end over a driver.
///
/// Cheap to clone; clones share the driver and the shape plan cache.
#[derive(Clone)]
pub struct Database {
    driver: Arc<dyn Driver>,
    reshaper: Reshaper,
    config: EngineConfig,
}

impl Database {
    /// Wrap `driver` with default settings
    pub fn new(driver: impl Driver + 'static) -> Self {
        Self::with_config(Arc::new(driver), EngineConfig::default())
    }

    /// Wrap a shared driver with explicit settings
    pub fn with_config(driver: Arc<dyn Driver>, config: EngineConfig) -> Self {
        let reshaper = Reshaper::with_config(config.reshape.clone());
        Database {
            driver,
            reshaper,
            config,
        }
    }

    /// Create a builder for database configuration.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Current settings
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The reshaper applied to result sets
    pub fn reshaper(&self) -> &Reshaper {
        &self.reshaper
    }

    /// Execute a statement on the pool and return its raw rows.
    pub fn query(&self, text: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.log_statement(text, params.len());
        self.driver
            .execute(text, params)
            .map_err(|e| e.with_query(text, params))
    }

    /// Execute on the pool and reshape the result.
    pub fn exec(&self, query: &Query) -> Result<Vec<Value>> {
        self.exec_within(query, &mut DriverExecutor(self.driver.as_ref()))
    }

    /// Execute on `target` (usually a transaction) and reshape the result.
    ///
    /// Execution errors carry the statement text and parameters.
    pub fn exec_within(&self, query: &Query, target: &mut dyn Executor) -> Result<Vec<Value>> {
        self.log_statement(&query.text, query.values.len());
        let rows = target
            .execute_query(query)
            .map_err(|e| e.with_query(&query.text, &query.values))?;
        Ok(self.reshaper.process(rows))
    }

    /// First reshaped entity, or `None` for an empty result.
    pub fn get(&self, query: &Query) -> Result<Option<Value>> {
        Ok(self.exec(query)?.into_iter().next())
    }

    /// Like [`get`](Self::get), on `target`
    pub fn get_within(&self, query: &Query, target: &mut dyn Executor) -> Result<Option<Value>> {
        Ok(self.exec_within(query, target)?.into_iter().next())
    }

    /// Map reshaped rows by the value of `key_column`.
    ///
    /// See [`ObjectMapper`] for how each row becomes a value. Rows for
    /// which `filter` returns false are skipped.
    pub fn all_object(
        &self,
        query: &Query,
        key_column: &str,
        mapper: ObjectMapper,
        filter: Option<&dyn Fn(&Value) -> bool>,
    ) -> Result<ObjectMap> {
        let rows = self.exec(query)?;
        Ok(collect_object(&rows, key_column, &mapper, filter))
    }

    /// Begin a transaction on the driver.
    pub fn begin(&self) -> Result<Box<dyn Transaction>> {
        let tx = self.driver.begin()?;
        debug!("transaction started");
        Ok(tx)
    }

    /// Run `f` inside a transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back when it returns `Err`. A
    /// failed rollback is logged and the original error is returned.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Executor) -> Result<T>,
    {
        let mut tx = self.begin()?;
        match f(&mut tx) {
            Ok(value) => {
                tx.commit()?;
                debug!("transaction committed");
                Ok(value)
            }
            Err(error) => {
                match tx.rollback() {
                    Ok(()) => debug!(error = %error, "transaction rolled back"),
                    Err(rollback) => {
                        warn!(error = %error, rollback = %rollback, "rollback after failure failed")
                    }
                }
                Err(error)
            }
        }
    }

    /// Defer `query`: a node that executes it once bound and resolves to
    /// the reshaped entities as an array.
    pub fn deferred(&self, query: impl Into<Query>) -> TxMonad {
        let reshaper = self.reshaper.clone();
        TxMonad::query(query).map(move |rows| Value::Array(reshaper.process(into_rows(rows))))
    }

    /// Begin a transaction, run `node` within it, then commit or roll back.
    pub fn run(&self, node: TxMonad) -> Result<Value> {
        let id = node.id();
        debug!(node = %id, "running deferred chain");
        self.transaction(move |tx| node.run_within(tx))
    }

    /// Release the driver's connections.
    pub fn close(&self) -> Result<()> {
        debug!("closing database");
        self.driver.close()
    }

    fn log_statement(&self, text: &str, params: usize) {
        if self.config.log_queries {
            debug!(sql = %text, params, "executing query");
        }
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn into_rows(value: Value) -> Vec<Row> {
    value
        .into_array()
        .unwrap_or_default()
        .into_iter()
        .filter_map(Value::into_object)
        .collect()
}

/// Builder for database configuration.
///
/// # Example
///
/// ```ignore
/// let db = Database::builder()
///     .driver(driver)
///     .config(EngineConfig::from_file("rowgraph.toml")?)
///     .specialize_threshold(16)
///     .build()?;
/// ```
#[derive(Default)]
pub struct DatabaseBuilder {
    driver: Option<Arc<dyn Driver>>,
    config: EngineConfig,
}

impl DatabaseBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the driver.
    pub fn driver(mut self, driver: impl Driver + 'static) -> Self {
        self.driver = Some(Arc::new(driver));
        self
    }

    /// Set a driver shared with other owners.
    pub fn shared_driver(mut self, driver: Arc<dyn Driver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Replace all settings.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Toggle per-statement debug events.
    pub fn log_queries(mut self, enabled: bool) -> Self {
        self.config.log_queries = enabled;
        self
    }

    /// Row count above which shape plans are used.
    pub fn specialize_threshold(mut self, rows: usize) -> Self {
        self.config.reshape.specialize_threshold = rows;
        self
    }

    /// Maximum number of cached shape plans.
    pub fn plan_cache_capacity(mut self, plans: usize) -> Self {
        self.config.reshape.plan_cache_capacity = plans;
        self
    }

    /// Build the database.
    ///
    /// Fails with [`Error::Config`] when no driver was set.
    pub fn build(self) -> Result<Database> {
        let driver = self
            .driver
            .ok_or_else(|| Error::Config("no driver configured".to_string()))?;
        Ok(Database::with_config(driver, self.config))
    }
}
