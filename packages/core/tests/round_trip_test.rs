//! Cross-Format Round Trip Tests
//!
//! Imports the example argument map (9 nodes, 6 edges), exports it in each
//! format, imports that export into a fresh store and checks the graph that
//! comes back out.
//!
//! ## Expected Losses
//! - CSV collapses multi-label edges into one comma-joined label
//! - CSV and XML drop extra node fields

#[cfg(test)]
mod round_trip_tests {
    use anyhow::Result;
    use graphbridge_core::{
        DanglingEdgePolicy, Graph, GraphBridgeConfig, GraphStore, StoreCounts, TransferService,
    };
    use serde_json::{json, Value};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn fixture() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/example_graph.json")
    }

    /// Helper to create a service over a fresh store inside `temp_dir`
    async fn create_service(temp_dir: &TempDir, name: &str) -> Result<TransferService> {
        let config = GraphBridgeConfig {
            database_path: temp_dir.path().join(format!("{name}.sqlite")),
            dangling_edges: DanglingEdgePolicy::Reject,
            ..Default::default()
        };
        Ok(TransferService::new(config).await?)
    }

    async fn read_json(path: &Path) -> Result<Value> {
        Ok(serde_json::from_slice(&tokio::fs::read(path).await?)?)
    }

    async fn stored_graph(service: &TransferService) -> Result<Graph> {
        Ok(service.store().read_graph().await?)
    }

    /// JSON → store → `format` → fresh store → JSON
    async fn round_trip(format: &str) -> Result<(Graph, Value)> {
        let temp_dir = TempDir::new()?;

        let first = create_service(&temp_dir, "first").await?;
        let report = first.import("json", Some(fixture().as_path())).await?;
        assert_eq!((report.nodes, report.edges), (9, 6));

        let exported = temp_dir.path().join(format!("test_export.{format}"));
        first.export(format, &exported).await?;
        first.close().await?;

        let second = create_service(&temp_dir, "second").await?;
        let report = second.import(format, Some(exported.as_path())).await?;
        assert_eq!(report.totals, StoreCounts { nodes: 9, edges: 6 });

        let final_json = temp_dir.path().join("final.json");
        let report = second.export("json", &final_json).await?;
        assert_eq!((report.nodes, report.edges), (9, 6));

        let graph = stored_graph(&second).await?;
        Ok((graph, read_json(&final_json).await?))
    }

    fn edge_labels(value: &Value) -> Vec<Value> {
        value["edges"]
            .as_array()
            .map(|edges| edges.iter().map(|edge| edge["label"].clone()).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_csv_round_trip() -> Result<()> {
        let (graph, value) = round_trip("csv").await?;

        assert_eq!(value["nodes"].as_array().map(Vec::len), Some(9));
        assert_eq!(value["edges"].as_array().map(Vec::len), Some(6));
        assert!(edge_labels(&value).contains(&json!(["supports,cites"])));
        assert!(graph.node("3").unwrap().extra.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_csv_export_writes_table_pair() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let service = create_service(&temp_dir, "store").await?;
        service.import("json", Some(fixture().as_path())).await?;

        let report = service
            .export("csv", &temp_dir.path().join("test_export.csv"))
            .await?;

        assert_eq!(
            report.files,
            vec![
                temp_dir.path().join("test_export_nodes.csv"),
                temp_dir.path().join("test_export_edges.csv"),
            ]
        );
        let nodes = tokio::fs::read_to_string(&report.files[0]).await?;
        assert!(nodes.starts_with("id,label,type\n"));
        assert_eq!(nodes.lines().count(), 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_xml_round_trip_keeps_multi_labels() -> Result<()> {
        let (graph, value) = round_trip("xml").await?;

        assert!(edge_labels(&value).contains(&json!(["supports", "cites"])));
        assert_eq!(graph.node("9").unwrap().node_type, "node");
        assert!(graph.node("3").unwrap().extra.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_yaml_round_trip_is_exact() -> Result<()> {
        let (graph, value) = round_trip("yaml").await?;

        let temp_dir = TempDir::new()?;
        let reference = create_service(&temp_dir, "reference").await?;
        let original = reference.check("json", &fixture()).await?;

        assert_eq!(graph, original);
        assert_eq!(value["nodes"][2]["source"], json!("Regional planning report"));
        Ok(())
    }

    #[tokio::test]
    async fn test_json_round_trip_is_exact() -> Result<()> {
        let (graph, _) = round_trip("json").await?;

        let temp_dir = TempDir::new()?;
        let reference = create_service(&temp_dir, "reference").await?;
        assert_eq!(graph, reference.check("json", &fixture()).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_bare_string_label_exported_as_sequence() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let service = create_service(&temp_dir, "store").await?;
        service.import("json", Some(fixture().as_path())).await?;

        let output = temp_dir.path().join("out.json");
        service.export("json", &output).await?;
        let value = read_json(&output).await?;

        assert_eq!(value["edges"][0]["source"], json!("2"));
        assert_eq!(value["edges"][0]["label"], json!(["supports"]));
        Ok(())
    }
}
