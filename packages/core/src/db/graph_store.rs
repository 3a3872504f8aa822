//! GraphStore Trait - Storage Abstraction Layer
//!
//! The orchestrator talks to storage only through [`GraphStore`]. The libsql
//! implementation is [`SqliteGraphStore`](crate::db::SqliteGraphStore); tests
//! and other backends can supply their own.
//!
//! # Examples
//!
//! ```rust,no_run
//! use graphbridge_core::db::{DatabaseService, GraphStore, SqliteGraphStore};
//! use graphbridge_core::models::{Edge, Graph, Node};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Arc::new(DatabaseService::new_in_memory().await?);
//!     let store: Arc<dyn GraphStore> = Arc::new(SqliteGraphStore::new(db));
//!
//!     let graph = Graph::from_parts(
//!         vec![Node::new("a", "Alpha"), Node::new("b", "Beta")],
//!         vec![Edge::new("a", "b", vec!["supports".to_string()])],
//!     );
//!     store.upsert_graph(&graph).await?;
//!     assert_eq!(store.read_graph().await?, graph);
//!     Ok(())
//! }
//! ```

use crate::db::{DatabaseError, StoreCounts, UpsertSummary};
use crate::models::{Edge, Graph, Node};
use async_trait::async_trait;

/// Persistence operations for whole graphs
///
/// Implementations must be `Send + Sync` so a store can be shared behind an
/// `Arc` across `.await` points.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Create tables and indexes if absent; safe to call repeatedly
    async fn ensure_schema(&self) -> Result<(), DatabaseError>;

    /// Write every node and edge of `graph` atomically
    ///
    /// Node ids and exact `(source, target, labels)` tuples that already
    /// exist are replaced. On error nothing from the batch is stored.
    async fn upsert_graph(&self, graph: &Graph) -> Result<UpsertSummary, DatabaseError>;

    /// All stored nodes in row order
    async fn read_all_nodes(&self) -> Result<Vec<Node>, DatabaseError>;

    /// All stored edges in row order
    async fn read_all_edges(&self) -> Result<Vec<Edge>, DatabaseError>;

    /// Nodes and edges read from a single snapshot
    async fn read_graph(&self) -> Result<Graph, DatabaseError>;

    async fn counts(&self) -> Result<StoreCounts, DatabaseError>;

    /// Flush pending writes; the store should not be used afterwards
    async fn close(&self) -> Result<(), DatabaseError>;
}
