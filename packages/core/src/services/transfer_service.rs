//! Transfer Service - Import/Export Orchestration
//!
//! Binds a format tag to its codec and runs the two pipelines:
//!
//! - import: `codec.load → validate → store.upsert_graph`
//! - export: `store.read_graph → codec.save`
//!
//! File access is delegated to the codec and persistence to the
//! [`GraphStore`]; the service itself only sequences the stages and
//! reports what happened.

use crate::codecs::{Format, GraphCodec};
use crate::config::GraphBridgeConfig;
use crate::db::{DatabaseService, GraphStore, SqliteGraphStore, StoreCounts};
use crate::models::Graph;
use crate::services::TransferError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result of a successful import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub format: Format,
    /// Files that were read
    pub files: Vec<PathBuf>,
    /// Nodes in the decoded graph
    pub nodes: usize,
    /// Edges in the decoded graph
    pub edges: usize,
    /// Edges whose endpoints were not stored nodes
    pub dangling_edges: usize,
    /// Store totals after the import committed
    pub totals: StoreCounts,
}

/// Result of a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub format: Format,
    /// Files that were written
    pub files: Vec<PathBuf>,
    pub nodes: usize,
    pub edges: usize,
}

/// Orchestrates imports into and exports out of a graph store
pub struct TransferService {
    config: GraphBridgeConfig,
    store: Arc<dyn GraphStore>,
}

impl TransferService {
    /// Validate `config` and open the libsql store it names
    pub async fn new(config: GraphBridgeConfig) -> Result<Self, TransferError> {
        config.validate()?;
        let db = DatabaseService::with_options(config.database_path.clone(), config.store_options())
            .await?;
        let store: Arc<dyn GraphStore> = Arc::new(SqliteGraphStore::new(Arc::new(db)));
        Ok(Self::with_store(config, store))
    }

    /// Use an already opened store
    pub fn with_store(config: GraphBridgeConfig, store: Arc<dyn GraphStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &GraphBridgeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Load `path` (or the configured default input) and store its graph
    ///
    /// # Errors
    ///
    /// - [`TransferError::UnknownFormat`] for an unrecognized tag
    /// - [`TransferError::NotFound`] when an input file is missing
    /// - [`TransferError::Codec`] for malformed input
    /// - [`TransferError::Structure`] when the data is not a valid graph
    /// - [`TransferError::Storage`] when the write fails; nothing is stored
    pub async fn import(
        &self,
        format: &str,
        path: Option<&Path>,
    ) -> Result<ImportReport, TransferError> {
        let format: Format = format.parse()?;
        let path = path.unwrap_or(&self.config.default_input);
        let codec = format.codec();

        tracing::info!("Importing {} from {}", format, path.display());
        let graph = load_graph(codec.as_ref(), path).await?;

        tracing::info!(
            "Storing {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        let summary = self.store.upsert_graph(&graph).await?;
        let totals = self.store.counts().await?;

        tracing::info!(
            "Import complete: store now holds {} nodes and {} edges",
            totals.nodes,
            totals.edges
        );

        Ok(ImportReport {
            format,
            files: codec.files_for(path),
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            dangling_edges: summary.dangling_edges,
            totals,
        })
    }

    /// Write the stored graph to `path` in `format`
    ///
    /// For CSV, `path` is the base name of the `_nodes.csv`/`_edges.csv`
    /// pair.
    pub async fn export(&self, format: &str, path: &Path) -> Result<ExportReport, TransferError> {
        let format: Format = format.parse()?;
        let codec = format.codec();

        tracing::info!("Exporting {} to {}", format, path.display());
        let graph = self.store.read_graph().await?;
        if graph.is_empty() {
            tracing::warn!("Store is empty; {} will hold an empty graph", path.display());
        }
        tracing::debug!(
            "Read {} nodes and {} edges from store",
            graph.node_count(),
            graph.edge_count()
        );

        let files = codec.save(&graph, path).await?;
        tracing::info!("Export complete: wrote {} file(s)", files.len());

        Ok(ExportReport {
            format,
            files,
            nodes: graph.node_count(),
            edges: graph.edge_count(),
        })
    }

    /// Load and validate `path` without touching the store
    pub async fn check(&self, format: &str, path: &Path) -> Result<Graph, TransferError> {
        let format: Format = format.parse()?;
        tracing::info!("Checking {} file {}", format, path.display());

        let graph = load_graph(format.codec().as_ref(), path).await?;
        let dangling = graph.dangling_edges().count();
        if dangling > 0 {
            tracing::warn!(
                "{} edge(s) reference nodes not present in {}",
                dangling,
                path.display()
            );
        }
        Ok(graph)
    }

    /// Current store totals
    pub async fn stats(&self) -> Result<StoreCounts, TransferError> {
        Ok(self.store.counts().await?)
    }

    /// Flush and release the store
    pub async fn close(&self) -> Result<(), TransferError> {
        Ok(self.store.close().await?)
    }
}

async fn load_graph(codec: &dyn GraphCodec, path: &Path) -> Result<Graph, TransferError> {
    let graph = codec.load(path).await?;
    tracing::debug!(
        "Decoded {} nodes and {} edges from {}",
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(graph)
}
