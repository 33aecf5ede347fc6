//! SQLite driver over one shared connection
//!
//! A transaction holds the connection lock from `BEGIN` until it is
//! committed, rolled back or dropped, so pool statements issued meanwhile
//! from other threads wait for it. Pool statements and `begin` issued from
//! the thread that owns the open transaction fail with
//! [`Error::Transaction`] instead of waiting on themselves.

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use rowgraph_core::{Driver, Error, Executor, Result, Row, Transaction, Value};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::debug;

/// Driver backed by a single SQLite connection
#[derive(Clone)]
pub struct SqliteDriver {
    conn: Arc<Mutex<Connection>>,
    /// Thread that began the open transaction; set only while `conn` is held
    owner: Arc<Mutex<Option<ThreadId>>>,
}

impl SqliteDriver {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(sql_error)?;
        debug!(path = %path.display(), "opened sqlite database");
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(sql_error)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: Connection) -> Self {
        SqliteDriver {
            conn: Arc::new(Mutex::new(conn)),
            owner: Arc::new(Mutex::new(None)),
        }
    }

    fn check_not_owner(&self) -> Result<()> {
        if *self.owner.lock() == Some(thread::current().id()) {
            return Err(Error::Transaction(
                "connection is held by a transaction open on this thread".to_string(),
            ));
        }
        Ok(())
    }
}

impl Driver for SqliteDriver {
    fn execute(&self, text: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.check_not_owner()?;
        run(&self.conn.lock(), text, params)
    }

    fn begin(&self) -> Result<Box<dyn Transaction>> {
        self.check_not_owner()?;
        let guard = self.conn.lock_arc();
        guard
            .execute_batch("BEGIN")
            .map_err(|e| Error::Transaction(e.to_string()))?;
        *self.owner.lock() = Some(thread::current().id());
        Ok(Box::new(SqliteTransaction {
            conn: Some(guard),
            owner: Arc::clone(&self.owner),
        }))
    }
}

/// Open transaction on a [`SqliteDriver`]; rolled back if dropped
pub struct SqliteTransaction {
    conn: Option<ArcMutexGuard<RawMutex, Connection>>,
    owner: Arc<Mutex<Option<ThreadId>>>,
}

impl SqliteTransaction {
    fn finish(&mut self, statement: &str) -> Result<()> {
        match self.conn.take() {
            Some(conn) => {
                let result = conn
                    .execute_batch(statement)
                    .map_err(|e| Error::Transaction(e.to_string()));
                // cleared before the guard is released
                *self.owner.lock() = None;
                result
            }
            None => Err(Error::Transaction("transaction already finished".to_string())),
        }
    }
}

impl Executor for SqliteTransaction {
    fn execute(&mut self, text: &str, params: &[Value]) -> Result<Vec<Row>> {
        match &self.conn {
            Some(conn) => run(conn, text, params),
            None => Err(Error::Transaction("transaction already finished".to_string())),
        }
    }
}

impl Transaction for SqliteTransaction {
    fn commit(mut self: Box<Self>) -> Result<()> {
        self.finish("COMMIT")
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        self.finish("ROLLBACK")
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if self.conn.is_some() {
            if let Err(e) = self.finish("ROLLBACK") {
                tracing::warn!(error = %e, "rollback of abandoned transaction failed");
            }
        }
    }
}

fn run(conn: &Connection, text: &str, params: &[Value]) -> Result<Vec<Row>> {
    let mut stmt = conn.prepare(text).map_err(sql_error)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let bound = params.iter().map(to_sql).collect::<Result<Vec<_>>>()?;

    let mut rows = stmt
        .query(rusqlite::params_from_iter(bound.iter()))
        .map_err(sql_error)?;
    let mut out = Vec::new();
    while let Some(r) = rows.next().map_err(sql_error)? {
        let mut row = Row::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            row.insert(name.clone(), from_sql(r.get_ref(i).map_err(sql_error)?));
        }
        out.push(row);
    }
    Ok(out)
}

fn to_sql(value: &Value) -> Result<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Bytes(b) => SqlValue::Blob(b.clone()),
        other => {
            return Err(Error::InvalidOperation(format!(
                "cannot bind {} as a sqlite parameter",
                other.type_name()
            )))
        }
    })
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    }
}

fn sql_error(error: rusqlite::Error) -> Error {
    Error::execution(error.to_string())
}
