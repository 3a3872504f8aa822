//! Database Connection Management
//!
//! This module owns the libsql database: opening it, creating the schema and
//! running the SQL behind every storage operation.
//!
//! # Architecture
//!
//! - **JSON node bodies**: each node is stored whole as a JSON document; its
//!   `id` is a generated column extracted from the body
//! - **Labels as JSON**: an edge's label sequence is stored serialized, so the
//!   uniqueness constraint applies to the exact label list
//! - **Replace on conflict**: node ids and `(source, target, properties)`
//!   tuples collide by replacement, never by error
//! - **WAL mode**: Write-Ahead Logging with a 5 second busy timeout
//!
//! # Connections
//!
//! The service opens one connection at construction time and keeps it for
//! its whole lifetime. An in-memory database only exists for as long as its
//! connection, so every operation has to go through that same handle.
//!
//! ```no_run
//! # use graphbridge_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/graph.sqlite")).await?;
//! let counts = db_service.db_counts().await?;
//! println!("{} nodes, {} edges", counts.nodes, counts.edges);
//! db_service.db_close().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use libsql::{Builder, Connection, Database, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Path that opens a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// What a write does with edges whose endpoints are not stored nodes
///
/// Endpoints are looked up in the store after the batch's nodes have been
/// written, so nodes from earlier imports satisfy references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DanglingEdgePolicy {
    /// Store them, logged at debug level
    #[default]
    Accept,
    /// Store them, logged at warn level
    Warn,
    /// Roll the whole batch back with [`DatabaseError::ReferentialIntegrity`]
    Reject,
}

impl fmt::Display for DanglingEdgePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DanglingEdgePolicy::Accept => "accept",
            DanglingEdgePolicy::Warn => "warn",
            DanglingEdgePolicy::Reject => "reject",
        })
    }
}

/// Behavior switches applied to every write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub dangling_edges: DanglingEdgePolicy,
}

/// Outcome of one committed upsert batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub nodes_written: usize,
    pub edges_written: usize,
    /// Edges in the batch with at least one endpoint missing from the store
    pub dangling_edges: usize,
}

/// Row totals of both tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub nodes: u64,
    pub edges: u64,
}

/// Parameters for one edge row (avoids too-many-arguments lint)
pub struct DbEdgeParams<'a> {
    pub source: &'a str,
    pub target: &'a str,
    /// JSON-serialized label sequence
    pub properties: &'a str,
}

/// Database service for managing the libsql connection and schema
#[derive(Clone)]
pub struct DatabaseService {
    /// libsql database (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file, or [`IN_MEMORY`]
    pub db_path: PathBuf,

    conn: Connection,
    options: StoreOptions,
}

impl fmt::Debug for DatabaseService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseService")
            .field("db_path", &self.db_path)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl DatabaseService {
    /// Open (or create) the database at `db_path` with default options
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - The path is empty
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        Self::with_options(db_path, StoreOptions::default()).await
    }

    /// Open a private in-memory database
    pub async fn new_in_memory() -> Result<Self, DatabaseError> {
        Self::with_options(PathBuf::from(IN_MEMORY), StoreOptions::default()).await
    }

    /// Open the database at `db_path` with explicit write options
    pub async fn with_options(
        db_path: PathBuf,
        options: StoreOptions,
    ) -> Result<Self, DatabaseError> {
        if db_path.as_os_str().is_empty() {
            return Err(DatabaseError::invalid_path(db_path));
        }

        let in_memory = db_path.as_os_str() == IN_MEMORY;
        // Only new files need the schema checkpointed to disk
        let is_new_database = !in_memory && !db_path.exists();

        if !in_memory {
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        if e.kind() == std::io::ErrorKind::PermissionDenied {
                            DatabaseError::permission_denied(db_path.clone())
                        } else {
                            DatabaseError::DirectoryCreationFailed(e)
                        }
                    })?;
                }
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;
        let conn = Self::connect_with_timeout(&db).await?;

        let service = Self {
            db: Arc::new(db),
            db_path,
            conn,
            options,
        };

        service.ensure_schema().await?;
        if is_new_database {
            service
                .execute_pragma("PRAGMA wal_checkpoint(TRUNCATE)")
                .await?;
        }

        tracing::debug!(
            "Opened database at {} (dangling edges: {})",
            service.db_path.display(),
            service.options.dangling_edges
        );

        Ok(service)
    }

    /// Options applied to writes
    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// The connection every operation runs on
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Open a connection with busy timeout configured
    ///
    /// Foreign keys are declared by the schema but deliberately not enforced;
    /// dangling edges are handled by [`DanglingEdgePolicy`] instead.
    async fn connect_with_timeout(db: &Database) -> Result<Connection, DatabaseError> {
        let conn = db.connect().map_err(DatabaseError::LibsqlError)?;
        for pragma in ["PRAGMA busy_timeout = 5000", "PRAGMA foreign_keys = OFF"] {
            Self::pragma_on(&conn, pragma).await?;
        }
        Ok(conn)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so we must use query() instead of execute().
    async fn execute_pragma(&self, pragma: &str) -> Result<(), DatabaseError> {
        Self::pragma_on(&self.conn, pragma).await
    }

    async fn pragma_on(conn: &Connection, pragma: &str) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Create tables and indexes if absent
    ///
    /// Idempotent; runs on every open.
    ///
    /// # Schema
    ///
    /// - `nodes`: JSON `body` plus generated, unique `id` (index `id_idx`)
    /// - `edges`: `source`, `target`, JSON label `properties`, unique on all
    ///   three with replace-on-conflict (indexes `source_idx`, `target_idx`)
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        self.execute_pragma("PRAGMA journal_mode = WAL").await?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS nodes (
                    body TEXT,
                    id TEXT GENERATED ALWAYS AS (json_extract(body, '$.id')) VIRTUAL NOT NULL UNIQUE
                )",
                (),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to create nodes table: {}", e))
            })?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS edges (
                    source TEXT,
                    target TEXT,
                    properties TEXT,
                    UNIQUE(source, target, properties) ON CONFLICT REPLACE,
                    FOREIGN KEY(source) REFERENCES nodes(id),
                    FOREIGN KEY(target) REFERENCES nodes(id)
                )",
                (),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to create edges table: {}", e))
            })?;

        for (name, statement) in [
            ("id_idx", "CREATE INDEX IF NOT EXISTS id_idx ON nodes(id)"),
            (
                "source_idx",
                "CREATE INDEX IF NOT EXISTS source_idx ON edges(source)",
            ),
            (
                "target_idx",
                "CREATE INDEX IF NOT EXISTS target_idx ON edges(target)",
            ),
        ] {
            self.conn.execute(statement, ()).await.map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to create index '{}': {}", name, e))
            })?;
        }

        Ok(())
    }

    /// Write a batch of nodes and edges in one transaction
    ///
    /// `node_bodies` are complete JSON node records. All nodes are written
    /// before any edge, then every edge's endpoints are checked against the
    /// store and the configured [`DanglingEdgePolicy`] applied.
    ///
    /// # Errors
    ///
    /// Any failure, including a rejected dangling edge, rolls the whole batch
    /// back before the error is returned.
    pub async fn db_upsert_graph(
        &self,
        node_bodies: &[String],
        edges: &[DbEdgeParams<'_>],
    ) -> Result<UpsertSummary, DatabaseError> {
        self.conn
            .execute("BEGIN TRANSACTION", ())
            .await
            .map_err(|e| {
                DatabaseError::transaction_failed(format!("Failed to begin transaction: {}", e))
            })?;

        let summary = match self.write_batch(node_bodies, edges).await {
            Ok(summary) => summary,
            Err(e) => {
                let _rollback = self.conn.execute("ROLLBACK", ()).await;
                return Err(e);
            }
        };

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            let _rollback = self.conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::transaction_failed(format!(
                "Failed to commit transaction: {}",
                e
            )));
        }

        tracing::debug!(
            "Committed {} nodes and {} edges",
            summary.nodes_written,
            summary.edges_written
        );
        Ok(summary)
    }

    async fn write_batch(
        &self,
        node_bodies: &[String],
        edges: &[DbEdgeParams<'_>],
    ) -> Result<UpsertSummary, DatabaseError> {
        for (index, body) in node_bodies.iter().enumerate() {
            self.conn
                .execute("INSERT OR REPLACE INTO nodes (body) VALUES (?)", [body.as_str()])
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!(
                        "Failed to insert node at index {}: {}",
                        index, e
                    ))
                })?;
        }

        for edge in edges {
            self.conn
                .execute(
                    "INSERT OR REPLACE INTO edges (source, target, properties) VALUES (?, ?, ?)",
                    (edge.source, edge.target, edge.properties),
                )
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!(
                        "Failed to insert edge {} -> {}: {}",
                        edge.source, edge.target, e
                    ))
                })?;
        }

        let dangling = self.find_dangling(edges).await?;
        if !dangling.is_empty() {
            match self.options.dangling_edges {
                DanglingEdgePolicy::Reject => {
                    return Err(DatabaseError::ReferentialIntegrity { dangling });
                }
                DanglingEdgePolicy::Warn => {
                    for edge in &dangling {
                        tracing::warn!("Edge {} references a missing node", edge);
                    }
                }
                DanglingEdgePolicy::Accept => {
                    tracing::debug!("Accepted {} dangling edge(s)", dangling.len());
                }
            }
        }

        Ok(UpsertSummary {
            nodes_written: node_bodies.len(),
            edges_written: edges.len(),
            dangling_edges: dangling.len(),
        })
    }

    /// `source -> target` for every edge with an endpoint not in `nodes`
    async fn find_dangling(&self, edges: &[DbEdgeParams<'_>]) -> Result<Vec<String>, DatabaseError> {
        let mut dangling = Vec::new();
        for edge in edges {
            let mut rows = self
                .conn
                .query(
                    "SELECT EXISTS(SELECT 1 FROM nodes WHERE id = ?1),
                            EXISTS(SELECT 1 FROM nodes WHERE id = ?2)",
                    (edge.source, edge.target),
                )
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to check edge endpoints: {}", e))
                })?;

            let row = rows
                .next()
                .await?
                .ok_or_else(|| DatabaseError::sql_execution("Endpoint check returned no row"))?;
            let source_exists: i64 = row.get(0)?;
            let target_exists: i64 = row.get(1)?;

            if source_exists == 0 || target_exists == 0 {
                dangling.push(format!("{} -> {}", edge.source, edge.target));
            }
        }
        Ok(dangling)
    }

    /// All node rows (`body`) in row order
    pub async fn db_read_nodes(&self) -> Result<Vec<Row>, DatabaseError> {
        self.collect_rows("SELECT body FROM nodes ORDER BY rowid", "nodes")
            .await
    }

    /// All edge rows (`source, target, properties`) in row order
    pub async fn db_read_edges(&self) -> Result<Vec<Row>, DatabaseError> {
        self.collect_rows(
            "SELECT source, target, properties FROM edges ORDER BY rowid",
            "edges",
        )
        .await
    }

    /// Node and edge rows read inside one transaction
    pub async fn db_read_snapshot(&self) -> Result<(Vec<Row>, Vec<Row>), DatabaseError> {
        self.conn.execute("BEGIN", ()).await.map_err(|e| {
            DatabaseError::transaction_failed(format!("Failed to begin read transaction: {}", e))
        })?;

        let snapshot = async {
            let nodes = self.db_read_nodes().await?;
            let edges = self.db_read_edges().await?;
            Ok::<_, DatabaseError>((nodes, edges))
        }
        .await;

        match snapshot {
            Ok(snapshot) => {
                self.conn.execute("COMMIT", ()).await.map_err(|e| {
                    DatabaseError::transaction_failed(format!(
                        "Failed to end read transaction: {}",
                        e
                    ))
                })?;
                Ok(snapshot)
            }
            Err(e) => {
                let _rollback = self.conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    async fn collect_rows(&self, sql: &str, table: &str) -> Result<Vec<Row>, DatabaseError> {
        let mut rows = self.conn.query(sql, ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to read {}: {}", table, e))
        })?;

        let mut collected = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            collected.push(row);
        }
        Ok(collected)
    }

    /// Row counts of both tables
    pub async fn db_counts(&self) -> Result<StoreCounts, DatabaseError> {
        Ok(StoreCounts {
            nodes: self.count_rows("SELECT COUNT(*) FROM nodes").await?,
            edges: self.count_rows("SELECT COUNT(*) FROM edges").await?,
        })
    }

    async fn count_rows(&self, sql: &str) -> Result<u64, DatabaseError> {
        let mut rows = self
            .conn
            .query(sql, ())
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to count rows: {}", e)))?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::sql_execution("COUNT(*) returned no row"))?;
        let count: i64 = row.get(0)?;
        Ok(count.max(0) as u64)
    }

    /// Checkpoint the WAL so the database file is complete on its own
    ///
    /// The connection itself is released when the last clone of the service
    /// is dropped.
    pub async fn db_close(&self) -> Result<(), DatabaseError> {
        self.execute_pragma("PRAGMA wal_checkpoint(TRUNCATE)")
            .await?;
        tracing::debug!("Closed database at {}", self.db_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn body(id: &str, label: &str) -> String {
        serde_json::json!({"id": id, "label": label, "type": "node"}).to_string()
    }

    fn edge<'a>(source: &'a str, target: &'a str, properties: &'a str) -> DbEdgeParams<'a> {
        DbEdgeParams {
            source,
            target,
            properties,
        }
    }

    async fn query_strings(db: &DatabaseService, sql: &str) -> Vec<String> {
        let mut rows = db.connection().query(sql, ()).await.unwrap();
        let mut values = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            values.push(row.get::<String>(0).unwrap());
        }
        values
    }

    #[tokio::test]
    async fn test_database_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path.clone()).await.unwrap();

        assert_eq!(db_service.db_path, db_path);
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_schema_has_exactly_two_tables() {
        let db_service = DatabaseService::new_in_memory().await.unwrap();

        let tables = query_strings(
            &db_service,
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .await;
        assert_eq!(tables, vec!["edges".to_string(), "nodes".to_string()]);
    }

    #[tokio::test]
    async fn test_indexes_created() {
        let db_service = DatabaseService::new_in_memory().await.unwrap();

        let indexes = query_strings(
            &db_service,
            "SELECT name FROM sqlite_master WHERE type='index' AND name LIKE '%_idx'",
        )
        .await;
        for expected in ["id_idx", "source_idx", "target_idx"] {
            assert!(indexes.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn test_wal_mode_enabled() {
        let temp_dir = TempDir::new().unwrap();
        let db_service = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();

        let mode = query_strings(&db_service, "PRAGMA journal_mode").await;
        assert_eq!(mode[0].to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_parent_directory_creation() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("nested").join("dirs").join("test.db");

        let _db_service = DatabaseService::new(nested_path.clone()).await.unwrap();

        assert!(nested_path.exists());
    }

    #[tokio::test]
    async fn test_empty_path_rejected() {
        let err = DatabaseService::new(PathBuf::new()).await.unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidPath { .. }));
    }

    #[tokio::test]
    async fn test_idempotent_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let first = DatabaseService::new(db_path.clone()).await.unwrap();
        first
            .db_upsert_graph(&[body("a", "A")], &[])
            .await
            .unwrap();
        first.db_close().await.unwrap();
        drop(first);

        let second = DatabaseService::new(db_path).await.unwrap();
        second.ensure_schema().await.unwrap();

        assert_eq!(second.db_counts().await.unwrap().nodes, 1);
    }

    #[tokio::test]
    async fn test_node_id_replaces() {
        let db_service = DatabaseService::new_in_memory().await.unwrap();

        db_service
            .db_upsert_graph(&[body("a", "first"), body("b", "B")], &[])
            .await
            .unwrap();
        db_service
            .db_upsert_graph(&[body("a", "second")], &[])
            .await
            .unwrap();

        let bodies: Vec<String> = db_service
            .db_read_nodes()
            .await
            .unwrap()
            .iter()
            .map(|row| row.get::<String>(0).unwrap())
            .collect();

        assert_eq!(bodies.len(), 2);
        assert!(bodies.iter().any(|b| b.contains("second")));
        assert!(!bodies.iter().any(|b| b.contains("first")));
    }

    #[tokio::test]
    async fn test_edge_tuple_replaces() {
        let db_service = DatabaseService::new_in_memory().await.unwrap();
        let nodes = [body("a", "A"), body("b", "B")];

        db_service
            .db_upsert_graph(&nodes, &[edge("a", "b", r#"["x"]"#)])
            .await
            .unwrap();
        db_service
            .db_upsert_graph(
                &nodes,
                &[edge("a", "b", r#"["x"]"#), edge("a", "b", r#"["y"]"#)],
            )
            .await
            .unwrap();

        let counts = db_service.db_counts().await.unwrap();
        assert_eq!(counts, StoreCounts { nodes: 2, edges: 2 });
    }

    #[tokio::test]
    async fn test_dangling_edges_counted_against_whole_store() {
        let db_service = DatabaseService::new_in_memory().await.unwrap();

        db_service
            .db_upsert_graph(&[body("a", "A")], &[])
            .await
            .unwrap();
        let summary = db_service
            .db_upsert_graph(
                &[body("b", "B")],
                &[edge("a", "b", r#"["x"]"#), edge("b", "ghost", r#"["y"]"#)],
            )
            .await
            .unwrap();

        assert_eq!(
            summary,
            UpsertSummary {
                nodes_written: 1,
                edges_written: 2,
                dangling_edges: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_reject_rolls_back_whole_batch() {
        let options = StoreOptions {
            dangling_edges: DanglingEdgePolicy::Reject,
        };
        let db_service = DatabaseService::with_options(PathBuf::from(IN_MEMORY), options)
            .await
            .unwrap();

        let err = db_service
            .db_upsert_graph(
                &[body("a", "A"), body("b", "B")],
                &[edge("a", "b", r#"["x"]"#), edge("a", "ghost", r#"["y"]"#)],
            )
            .await
            .unwrap_err();

        match err {
            DatabaseError::ReferentialIntegrity { dangling } => {
                assert_eq!(dangling, vec!["a -> ghost".to_string()]);
            }
            other => panic!("expected ReferentialIntegrity, got {other:?}"),
        }
        assert_eq!(db_service.db_counts().await.unwrap(), StoreCounts::default());

        // The connection is usable again after the rollback
        db_service
            .db_upsert_graph(&[body("a", "A")], &[])
            .await
            .unwrap();
        assert_eq!(db_service.db_counts().await.unwrap().nodes, 1);
    }

    #[tokio::test]
    async fn test_snapshot_reads_in_row_order() {
        let db_service = DatabaseService::new_in_memory().await.unwrap();
        db_service
            .db_upsert_graph(
                &[body("z", "Z"), body("a", "A")],
                &[edge("z", "a", r#"["x"]"#)],
            )
            .await
            .unwrap();

        let (nodes, edges) = db_service.db_read_snapshot().await.unwrap();
        let first: String = nodes[0].get(0).unwrap();
        assert!(first.contains("\"z\""));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].get::<String>(2).unwrap(), r#"["x"]"#);
    }

    #[test]
    fn test_policy_serde_names() {
        assert_eq!(
            serde_json::to_value(DanglingEdgePolicy::Reject).unwrap(),
            serde_json::json!("reject")
        );
        assert_eq!(DanglingEdgePolicy::default(), DanglingEdgePolicy::Accept);
        assert_eq!(DanglingEdgePolicy::Warn.to_string(), "warn");
    }
}
