//! Runtime Configuration
//!
//! [`GraphBridgeConfig`] is built by the caller (the CLI, or a test) and
//! handed to [`TransferService`](crate::services::TransferService) when it is
//! constructed. The core never reads environment variables or arguments.

use crate::db::{DanglingEdgePolicy, StoreOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Database file used when none is given
pub const DEFAULT_DATABASE_PATH: &str = "graph.sqlite";

/// Input file `import` reads when none is given
pub const DEFAULT_INPUT: &str = "graph.json";

pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Invalid configuration values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configuration field '{0}' must not be empty")]
    EmptyPath(&'static str),

    #[error("Unknown log level '{0}' (expected one of: trace, debug, info, warn, error)")]
    InvalidLogLevel(String),
}

/// Settings for one import/export session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphBridgeConfig {
    /// Store file (default: `graph.sqlite`)
    pub database_path: PathBuf,
    /// File `import` reads when no path is given (default: `graph.json`)
    pub default_input: PathBuf,
    /// Fallback log level when `RUST_LOG` is unset (default: `info`)
    pub log_level: String,
    /// Handling of edges whose endpoints are not stored (default: accept)
    pub dangling_edges: DanglingEdgePolicy,
}

impl Default for GraphBridgeConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            default_input: PathBuf::from(DEFAULT_INPUT),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            dangling_edges: DanglingEdgePolicy::default(),
        }
    }
}

impl GraphBridgeConfig {
    /// Check every field, returning the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("database_path"));
        }
        if self.default_input.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("default_input"));
        }
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }
        Ok(())
    }

    /// Write options for the store
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            dangling_edges: self.dangling_edges,
        }
    }
}
