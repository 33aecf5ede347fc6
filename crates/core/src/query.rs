//! Query descriptors
//!
//! A [`Query`] is the `{text, values}` pair produced by a query builder. It
//! is the unit handed to the execute capability and to the transaction
//! monad.

use crate::value::Value;
use std::fmt;

/// Parameterized statement ready for execution
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Statement text with backend-specific placeholders
    pub text: String,
    /// Values bound to the placeholders, in order
    pub values: Vec<Value>,
}

impl Query {
    /// Create a query from text and parameter values
    pub fn new(text: impl Into<String>, values: Vec<Value>) -> Self {
        Query {
            text: text.into(),
            values,
        }
    }

    /// Create a query without parameters
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new())
    }

    /// Append a parameter value
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)?;
        if !self.values.is_empty() {
            write!(f, " {:?}", self.values)?;
        }
        Ok(())
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Query::text(text)
    }
}

impl From<String> for Query {
    fn from(text: String) -> Self {
        Query::text(text)
    }
}

impl<T: Into<String>> From<(T, Vec<Value>)> for Query {
    fn from((text, values): (T, Vec<Value>)) -> Self {
        Query::new(text, values)
    }
}
