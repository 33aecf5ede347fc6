//! Capabilities consumed from the database driver
//!
//! rowgraph never talks to a backend directly. It consumes:
//! - [`Executor`]: run `(text, params)` and return rows
//! - [`Driver`]: a shareable pool that can also [`Driver::begin`] a transaction
//! - [`Transaction`]: an exclusive executor that is committed or rolled back
//!
//! Execution takes `&mut self`, so holding a `&mut dyn Executor` is proof of
//! exclusive use of the connection for the duration of a call.

use crate::error::Result;
use crate::query::Query;
use crate::row::Row;
use crate::value::Value;

/// Something that can execute a statement and return its rows
pub trait Executor {
    /// Execute `text` with positional `params`.
    ///
    /// Statements that return no rows yield an empty vector.
    fn execute(&mut self, text: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Execute a query descriptor
    fn execute_query(&mut self, query: &Query) -> Result<Vec<Row>> {
        self.execute(&query.text, &query.values)
    }
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn execute(&mut self, text: &str, params: &[Value]) -> Result<Vec<Row>> {
        (**self).execute(text, params)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(&mut self, text: &str, params: &[Value]) -> Result<Vec<Row>> {
        (**self).execute(text, params)
    }
}

/// An open transaction on a single connection
pub trait Transaction: Executor + Send {
    /// Commit all statements executed within the transaction
    fn commit(self: Box<Self>) -> Result<()>;

    /// Discard all statements executed within the transaction
    fn rollback(self: Box<Self>) -> Result<()>;
}

/// Connection pool capability
///
/// Implementations must be shareable across threads; each transaction they
/// hand out is used by one caller at a time.
pub trait Driver: Send + Sync {
    /// Execute a statement outside any explicit transaction
    fn execute(&self, text: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Begin a transaction
    fn begin(&self) -> Result<Box<dyn Transaction>>;

    /// Release pooled connections
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Adapter that lets a shared [`Driver`] be used where an [`Executor`] is expected
pub struct DriverExecutor<'a, D: Driver + ?Sized>(pub &'a D);

impl<D: Driver + ?Sized> Executor for DriverExecutor<'_, D> {
    fn execute(&mut self, text: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.0.execute(text, params)
    }
}
