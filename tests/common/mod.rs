//! Shared helpers for rowgraph integration tests.
//!
//! [`RecordingDriver`] answers canned statements, echoes everything else as
//! one `{text, params}` row, fails statements starting with `fail`, and
//! records every statement plus `BEGIN`/`COMMIT`/`ROLLBACK` in order.

#![allow(dead_code)]

pub use rowgraph::row;
pub use rowgraph::prelude::*;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

type Log = Arc<Mutex<Vec<String>>>;
type Responses = Arc<HashMap<String, Vec<Row>>>;

#[derive(Clone, Default)]
pub struct RecordingDriver {
    log: Log,
    responses: Responses,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `rows` whenever `text` is executed
    pub fn respond(mut self, text: &str, rows: Vec<Row>) -> Self {
        Arc::make_mut(&mut self.responses).insert(text.to_string(), rows);
        self
    }

    /// Everything executed so far, including transaction boundaries
    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    fn answer(log: &Log, responses: &Responses, text: &str, params: &[Value]) -> Result<Vec<Row>> {
        log.lock().push(text.to_string());
        if text.starts_with("fail") {
            return Err(Error::execution(format!("cannot run {text}")));
        }
        Ok(match responses.get(text) {
            Some(rows) => rows.clone(),
            None => vec![echo_row(text, params)],
        })
    }
}

impl Driver for RecordingDriver {
    fn execute(&self, text: &str, params: &[Value]) -> Result<Vec<Row>> {
        Self::answer(&self.log, &self.responses, text, params)
    }

    fn begin(&self) -> Result<Box<dyn Transaction>> {
        self.log.lock().push("BEGIN".to_string());
        Ok(Box::new(RecordingTx {
            log: Arc::clone(&self.log),
            responses: Arc::clone(&self.responses),
        }))
    }
}

pub struct RecordingTx {
    log: Log,
    responses: Responses,
}

impl Executor for RecordingTx {
    fn execute(&mut self, text: &str, params: &[Value]) -> Result<Vec<Row>> {
        RecordingDriver::answer(&self.log, &self.responses, text, params)
    }
}

impl Transaction for RecordingTx {
    fn commit(self: Box<Self>) -> Result<()> {
        self.log.lock().push("COMMIT".to_string());
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        self.log.lock().push("ROLLBACK".to_string());
        Ok(())
    }
}

/// Executor that only echoes, for running chains without a driver
#[derive(Default)]
pub struct EchoTx {
    pub executed: Vec<String>,
}

impl Executor for EchoTx {
    fn execute(&mut self, text: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.executed.push(text.to_string());
        if text.starts_with("fail") {
            return Err(Error::execution(format!("cannot run {text}")));
        }
        Ok(vec![echo_row(text, params)])
    }
}

pub fn echo_row(text: &str, params: &[Value]) -> Row {
    row([
        ("text", Value::from(text)),
        ("params", Value::Array(params.to_vec())),
    ])
}

/// `text` of the first echoed row
pub fn text_of(value: &Value) -> String {
    value
        .as_array()
        .and_then(|rows| rows.first())
        .and_then(|r| r.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub fn json(v: serde_json::Value) -> Value {
    Value::from(v)
}

/// Rows from a JSON array of flat objects
pub fn rows(v: serde_json::Value) -> Vec<Row> {
    json(v)
        .into_array()
        .unwrap_or_default()
        .into_iter()
        .filter_map(Value::into_object)
        .collect()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::TRACE)
        .with_test_writer()
        .try_init();
}
