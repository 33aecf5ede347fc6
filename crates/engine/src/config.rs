//! Engine configuration
//!
//! ```toml
//! log_queries = true
//!
//! [reshape]
//! specialize_threshold = 4
//! plan_cache_capacity = 64
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use rowgraph_core::{Error, Result};
use rowgraph_reshape::ReshapeConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for a [`Database`](crate::Database)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Emit a `debug` event for every executed statement
    pub log_queries: bool,
    /// Reshaper tuning
    pub reshape: ReshapeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            log_queries: true,
            reshape: ReshapeConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|error| Error::Config(format!("parse failed: {error}")))
    }

    /// Load a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|error| {
            Error::Config(format!("read failed path={} error={error}", path.display()))
        })?;
        Self::from_toml_str(&raw).map_err(|error| match error {
            Error::Config(msg) => Error::Config(format!("{msg} path={}", path.display())),
            other => other,
        })
    }

    /// Render as a TOML document
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|error| Error::Serialization(error.to_string()))
    }
}
