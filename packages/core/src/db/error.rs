//! Database Error Types
//!
//! This module defines error types for storage operations, covering
//! connection, schema, query, decoding of stored records and the dangling
//! edge check performed during writes.

use std::path::PathBuf;
use thiserror::Error;

/// Database operation errors
///
/// Any error returned from a write means the whole batch was rolled back.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish database connection
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Invalid database path provided
    #[error("Invalid database path: {path}")]
    InvalidPath { path: PathBuf },

    /// Permission denied when accessing database
    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    /// Failed to create parent directory
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// libsql operation error
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },

    /// A stored row could not be turned back into a graph entry
    #[error("Corrupt record in '{table}': {message}")]
    CorruptRecord { table: &'static str, message: String },

    /// Edges reference node ids that exist neither in the batch nor the store
    #[error(
        "{} edge(s) reference missing nodes: {}",
        dangling.len(),
        dangling.join(", ")
    )]
    ReferentialIntegrity { dangling: Vec<String> },

    /// BEGIN/COMMIT failed
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

impl DatabaseError {
    /// Create a connection failed error
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: PathBuf) -> Self {
        Self::InvalidPath { path }
    }

    /// Create a permission denied error
    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    /// Create a SQL execution error with context
    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }

    /// Create a corrupt record error for `table`
    pub fn corrupt_record(table: &'static str, message: impl ToString) -> Self {
        Self::CorruptRecord {
            table,
            message: message.to_string(),
        }
    }

    /// Create a transaction error
    pub fn transaction_failed(msg: impl Into<String>) -> Self {
        Self::TransactionFailed(msg.into())
    }
}
