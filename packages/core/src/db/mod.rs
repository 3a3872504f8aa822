//! Database Layer
//!
//! This module handles all storage using libsql (embedded SQLite):
//!
//! - Database initialization and connection management
//! - Idempotent schema creation (`nodes` and `edges` tables)
//! - Transactional bulk upsert with replace-on-conflict semantics
//! - Snapshot reads for export
//!
//! # Architecture
//!
//! [`DatabaseService`] owns the connection and all SQL. [`SqliteGraphStore`]
//! converts between rows and the graph model and implements the
//! [`GraphStore`] trait the orchestrator depends on.

mod database;
mod error;
mod graph_store;
mod sqlite_store;

pub use database::{
    DanglingEdgePolicy, DatabaseService, DbEdgeParams, StoreCounts, StoreOptions, UpsertSummary,
    IN_MEMORY,
};
pub use error::DatabaseError;
pub use graph_store::GraphStore;
pub use sqlite_store::SqliteGraphStore;
