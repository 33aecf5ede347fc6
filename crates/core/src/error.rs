//! Error types for rowgraph.
//!
//! A single error enum is shared by the reshaper, the transaction monad and
//! the engine so that rejections can flow through a chain unchanged.

use crate::value::Value;
use thiserror::Error;

/// All rowgraph errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying execute capability failed.
    ///
    /// `query` and `params` are filled in by [`Error::with_query`] once the
    /// failing statement is known.
    #[error("{}", render_execution(.message, .query.as_deref(), .params))]
    Execution {
        /// Driver-provided message
        message: String,
        /// Offending query text, if known
        query: Option<String>,
        /// Parameter values bound to the query
        params: Vec<Value>,
    },

    /// Beginning, committing or rolling back a transaction failed
    #[error("transaction error: {0}")]
    Transaction(String),

    /// A continuation rejected the chain
    #[error("rejected: {0}")]
    Rejected(String),

    /// Operation not valid in the current state
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Configuration could not be loaded or is invalid
    #[error("config error: {0}")]
    Config(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for rowgraph operations.
pub type Result<T> = std::result::Result<T, Error>;

fn render_execution(message: &str, query: Option<&str>, params: &[Value]) -> String {
    match query {
        Some(text) => format!("SQL error: {}\n{}\n{:?}", message, text, params),
        None => format!("SQL error: {}", message),
    }
}

impl Error {
    /// Create an execution error from a driver message.
    pub fn execution(message: impl Into<String>) -> Self {
        Error::Execution {
            message: message.into(),
            query: None,
            params: Vec::new(),
        }
    }

    /// Create a rejection, the error a continuation returns to fail a chain.
    pub fn rejected(message: impl Into<String>) -> Self {
        Error::Rejected(message.into())
    }

    /// Annotate an execution error with the statement that produced it.
    ///
    /// Non-execution errors are returned unchanged.
    pub fn with_query(self, text: &str, values: &[Value]) -> Self {
        match self {
            Error::Execution { message, .. } => Error::Execution {
                message,
                query: Some(text.to_string()),
                params: values.to_vec(),
            },
            other => other,
        }
    }

    /// Check if this error came from the execute capability.
    pub fn is_execution(&self) -> bool {
        matches!(self, Error::Execution { .. })
    }

    /// Check if this error was raised by a continuation.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Rejected(_))
    }

    /// Query text attached to an execution error, if any.
    pub fn query_text(&self) -> Option<&str> {
        match self {
            Error::Execution { query, .. } => query.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
