//! GraphBridge CLI
//!
//! Imports graphs into a libsql store and exports them back out.
//!
//! # Usage
//!
//! ```bash
//! # Import graph.json into graph.sqlite
//! graphbridge import json
//!
//! # Export the store as a CSV pair (out_nodes.csv, out_edges.csv)
//! graphbridge export csv out.csv
//!
//! # Refuse edges whose endpoints are not stored nodes
//! graphbridge --reject-dangling import yaml graph.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `GRAPHBRIDGE_DB`: Store path (default: graph.sqlite)
//! - `RUST_LOG`: Logging filter, overrides `--log-level`

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use graphbridge_core::config::DEFAULT_LOG_LEVEL;
use graphbridge_core::{DanglingEdgePolicy, GraphBridgeConfig, TransferService};

#[derive(Parser)]
#[command(
    name = "graphbridge",
    version,
    about = "Move labeled graphs between JSON, CSV, XML, YAML and a SQLite store"
)]
struct Cli {
    /// Store file
    #[arg(long, default_value = "graph.sqlite", global = true, env = "GRAPHBRIDGE_DB")]
    db: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = DEFAULT_LOG_LEVEL, global = true)]
    log_level: String,

    /// Fail an import whose edges reference missing nodes
    #[arg(long, global = true, conflicts_with = "warn_dangling")]
    reject_dangling: bool,

    /// Log a warning for every edge that references a missing node
    #[arg(long, global = true)]
    warn_dangling: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a graph file and store it
    Import {
        /// json, csv, xml or yaml
        format: String,
        /// Input file; for csv the base of the _nodes/_edges pair (default: graph.json)
        file: Option<PathBuf>,
    },
    /// Write the stored graph to a file
    Export {
        /// json, csv, xml or yaml
        format: String,
        /// Output file; for csv the base of the _nodes/_edges pair
        file: PathBuf,
    },
    /// Validate a graph file without storing it
    Check {
        /// json, csv, xml or yaml
        format: String,
        file: PathBuf,
    },
    /// Print store totals
    Stats,
}

impl Cli {
    fn config(&self) -> GraphBridgeConfig {
        let dangling_edges = if self.reject_dangling {
            DanglingEdgePolicy::Reject
        } else if self.warn_dangling {
            DanglingEdgePolicy::Warn
        } else {
            DanglingEdgePolicy::Accept
        };

        GraphBridgeConfig {
            database_path: self.db.clone(),
            log_level: self.log_level.clone(),
            dangling_edges,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config();
    let service = TransferService::new(config.clone())
        .await
        .with_context(|| format!("Failed to open store {}", config.database_path.display()))?;

    let result = execute(&service, cli.command).await;
    let closed = service.close().await;

    result?;
    closed.context("Failed to close store")?;
    Ok(())
}

async fn execute(service: &TransferService, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Import { format, file } => {
            let report = service.import(&format, file.as_deref()).await?;
            println!(
                "Imported {} nodes and {} edges from {}",
                report.nodes,
                report.edges,
                display_files(&report.files)
            );
            if report.dangling_edges > 0 {
                println!(
                    "{} edge(s) reference nodes that are not stored",
                    report.dangling_edges
                );
            }
            println!(
                "Store now holds {} nodes and {} edges",
                report.totals.nodes, report.totals.edges
            );
        }
        Commands::Export { format, file } => {
            let report = service.export(&format, &file).await?;
            println!(
                "Exported {} nodes and {} edges to {}",
                report.nodes,
                report.edges,
                display_files(&report.files)
            );
        }
        Commands::Check { format, file } => {
            let graph = service.check(&format, &file).await?;
            println!(
                "{} is a valid graph: {} nodes, {} edges",
                file.display(),
                graph.node_count(),
                graph.edge_count()
            );
        }
        Commands::Stats => {
            let counts = service.stats().await?;
            println!("Nodes: {}", counts.nodes);
            println!("Edges: {}", counts.edges);
        }
    }
    Ok(())
}

fn display_files(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|file| file.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
