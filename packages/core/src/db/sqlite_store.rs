//! SqliteGraphStore - GraphStore backed by DatabaseService
//!
//! Converts between the graph model and the rows [`DatabaseService`] reads
//! and writes. All SQL lives in `DatabaseService`.

use crate::db::{
    DatabaseError, DatabaseService, DbEdgeParams, GraphStore, StoreCounts, UpsertSummary,
};
use crate::models::{Edge, Graph, Node};
use async_trait::async_trait;
use libsql::Row;
use std::sync::Arc;

/// libsql implementation of [`GraphStore`]
#[derive(Debug, Clone)]
pub struct SqliteGraphStore {
    db: Arc<DatabaseService>,
}

impl SqliteGraphStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Underlying database service
    pub fn database(&self) -> &Arc<DatabaseService> {
        &self.db
    }

    /// Convert a `nodes` row (`body`) to a Node
    fn row_to_node(row: &Row) -> Result<Node, DatabaseError> {
        let body: String = row
            .get(0)
            .map_err(|e| DatabaseError::corrupt_record("nodes", e))?;
        serde_json::from_str(&body).map_err(|e| DatabaseError::corrupt_record("nodes", e))
    }

    /// Convert an `edges` row (`source, target, properties`) to an Edge
    fn row_to_edge(row: &Row) -> Result<Edge, DatabaseError> {
        let source: String = row
            .get(0)
            .map_err(|e| DatabaseError::corrupt_record("edges", e))?;
        let target: String = row
            .get(1)
            .map_err(|e| DatabaseError::corrupt_record("edges", e))?;
        let properties: String = row
            .get(2)
            .map_err(|e| DatabaseError::corrupt_record("edges", e))?;

        let label: Vec<String> = serde_json::from_str(&properties).map_err(|e| {
            DatabaseError::corrupt_record(
                "edges",
                format!("label of {} -> {} is not a string list: {}", source, target, e),
            )
        })?;

        Ok(Edge::new(source, target, label))
    }
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        self.db.ensure_schema().await
    }

    async fn upsert_graph(&self, graph: &Graph) -> Result<UpsertSummary, DatabaseError> {
        let node_bodies = graph
            .nodes()
            .map(|node| {
                serde_json::to_string(node).map_err(|e| {
                    DatabaseError::sql_execution(format!(
                        "Failed to serialize node {}: {}",
                        node.id, e
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let labels = graph
            .edges()
            .map(|edge| {
                serde_json::to_string(&edge.label).map_err(|e| {
                    DatabaseError::sql_execution(format!(
                        "Failed to serialize labels of {} -> {}: {}",
                        edge.source, edge.target, e
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let edges: Vec<DbEdgeParams<'_>> = graph
            .edges()
            .zip(&labels)
            .map(|(edge, properties)| DbEdgeParams {
                source: &edge.source,
                target: &edge.target,
                properties,
            })
            .collect();

        self.db.db_upsert_graph(&node_bodies, &edges).await
    }

    async fn read_all_nodes(&self) -> Result<Vec<Node>, DatabaseError> {
        let rows = self.db.db_read_nodes().await?;
        rows.iter().map(Self::row_to_node).collect()
    }

    async fn read_all_edges(&self) -> Result<Vec<Edge>, DatabaseError> {
        let rows = self.db.db_read_edges().await?;
        rows.iter().map(Self::row_to_edge).collect()
    }

    async fn read_graph(&self) -> Result<Graph, DatabaseError> {
        let (node_rows, edge_rows) = self.db.db_read_snapshot().await?;

        let nodes = node_rows
            .iter()
            .map(Self::row_to_node)
            .collect::<Result<Vec<_>, _>>()?;
        let edges = edge_rows
            .iter()
            .map(Self::row_to_edge)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Graph::from_parts(nodes, edges))
    }

    async fn counts(&self) -> Result<StoreCounts, DatabaseError> {
        self.db.db_counts().await
    }

    async fn close(&self) -> Result<(), DatabaseError> {
        self.db.db_close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DanglingEdgePolicy, StoreOptions};
    use serde_json::json;
    use tempfile::TempDir;

    async fn create_test_store() -> Result<(SqliteGraphStore, TempDir), DatabaseError> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(DatabaseService::new(db_path).await?);
        Ok((SqliteGraphStore::new(db), temp_dir))
    }

    fn sample_graph() -> Graph {
        Graph::from_parts(
            vec![
                Node::new("1", "Taxes should be lowered").with_type("claim"),
                Node::new("2", "Growth follows cuts")
                    .with_type("evidence")
                    .with_extra("source", json!({"year": 2019})),
                Node::new("3", "Deficits grow"),
            ],
            vec![
                Edge::new("2", "1", vec!["supports".to_string()]),
                Edge::new("3", "1", vec!["attacks".to_string(), "cites".to_string()]),
            ],
        )
    }

    #[tokio::test]
    async fn test_upsert_and_read_graph() -> Result<(), DatabaseError> {
        let (store, _temp_dir) = create_test_store().await?;
        let graph = sample_graph();

        let summary = store.upsert_graph(&graph).await?;
        assert_eq!(summary.nodes_written, 3);
        assert_eq!(summary.edges_written, 2);
        assert_eq!(summary.dangling_edges, 0);

        let stored = store.read_graph().await?;
        assert_eq!(stored, graph);
        assert_eq!(
            stored.node("2").unwrap().extra.get("source"),
            Some(&json!({"year": 2019}))
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent() -> Result<(), DatabaseError> {
        let (store, _temp_dir) = create_test_store().await?;
        let graph = sample_graph();

        store.upsert_graph(&graph).await?;
        let once = store.counts().await?;
        store.upsert_graph(&graph).await?;

        assert_eq!(store.counts().await?, once);
        assert_eq!(once, StoreCounts { nodes: 3, edges: 2 });
        Ok(())
    }

    #[tokio::test]
    async fn test_label_order_distinguishes_edges() -> Result<(), DatabaseError> {
        let (store, _temp_dir) = create_test_store().await?;
        let graph = Graph::from_parts(
            vec![Node::new("a", "A"), Node::new("b", "B")],
            vec![
                Edge::new("a", "b", vec!["x".to_string(), "y".to_string()]),
                Edge::new("a", "b", vec!["y".to_string(), "x".to_string()]),
                Edge::new("a", "b", vec!["x".to_string()]),
            ],
        );

        store.upsert_graph(&graph).await?;
        assert_eq!(store.read_all_edges().await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_read_scans_follow_row_order() -> Result<(), DatabaseError> {
        let (store, _temp_dir) = create_test_store().await?;
        store.upsert_graph(&sample_graph()).await?;

        let ids: Vec<String> = store
            .read_all_nodes()
            .await?
            .into_iter()
            .map(|node| node.id)
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);

        let edges = store.read_all_edges().await?;
        assert_eq!(edges[0].source, "2");
        assert_eq!(edges[1].label, vec!["attacks", "cites"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_label_is_reported() -> Result<(), DatabaseError> {
        let (store, _temp_dir) = create_test_store().await?;
        store
            .database()
            .connection()
            .execute(
                "INSERT INTO edges (source, target, properties) VALUES ('a', 'b', 'not json')",
                (),
            )
            .await?;

        let err = store.read_all_edges().await.unwrap_err();
        assert!(matches!(err, DatabaseError::CorruptRecord { table: "edges", .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_warn_policy_still_stores() -> Result<(), DatabaseError> {
        let options = StoreOptions {
            dangling_edges: DanglingEdgePolicy::Warn,
        };
        let db = Arc::new(DatabaseService::with_options(":memory:".into(), options).await?);
        let store = SqliteGraphStore::new(db);

        let graph = Graph::from_parts(
            vec![Node::new("a", "A")],
            vec![Edge::new("a", "missing", vec!["x".to_string()])],
        );
        let summary = store.upsert_graph(&graph).await?;

        assert_eq!(summary.dangling_edges, 1);
        assert_eq!(store.read_graph().await?, graph);
        Ok(())
    }
}
