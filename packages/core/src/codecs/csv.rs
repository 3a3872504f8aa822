//! CSV codec: a nodes table and an edges table derived from one base path.
//!
//! # File Naming
//!
//! A trailing `.csv` is stripped from the logical path, then `_nodes.csv` and
//! `_edges.csv` are appended. `export csv out.csv` and `export csv out` both
//! write `out_nodes.csv` and `out_edges.csv`; imports resolve the same way.
//!
//! # Columns
//!
//! - nodes: `id,label,type`
//! - edges: `source,target,label`
//!
//! Empty cells are treated as absent fields. Extra node fields are not
//! written.
//!
//! # Label Collapse
//!
//! An edge's label sequence is stored in a single cell. See [`join_labels`]
//! and [`split_label`]: the conversion is one-way for multi-label edges.

use crate::codecs::{CodecError, Document, Format, GraphCodec};
use crate::models::Graph;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const NODE_COLUMNS: [&str; 3] = ["id", "label", "type"];
pub const EDGE_COLUMNS: [&str; 3] = ["source", "target", "label"];

/// Node and edge file paths for a logical CSV path
pub fn csv_paths(path: &Path) -> (PathBuf, PathBuf) {
    let base = if path.extension().is_some_and(|ext| ext == "csv") {
        path.with_extension("")
    } else {
        path.to_path_buf()
    };

    let with_suffix = |suffix: &str| {
        let mut name = OsString::from(base.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    };

    (with_suffix("_nodes.csv"), with_suffix("_edges.csv"))
}

/// Collapse an edge's labels into one CSV cell by joining with `,`.
///
/// This is lossy: `["a", "b"]` and `["a,b"]` produce the same cell, and
/// [`split_label`] reads either back as the single label `"a,b"`.
pub fn join_labels(labels: &[String]) -> String {
    labels.join(",")
}

/// Read an edge label cell back as a one-element label sequence.
///
/// Commas are not split; see [`join_labels`].
pub fn split_label(cell: &str) -> Vec<String> {
    vec![cell.to_string()]
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvCodec;

#[async_trait]
impl GraphCodec for CsvCodec {
    fn format(&self) -> Format {
        Format::Csv
    }

    fn files_for(&self, path: &Path) -> Vec<PathBuf> {
        let (nodes, edges) = csv_paths(path);
        vec![nodes, edges]
    }

    fn decode(&self, documents: &[Document]) -> Result<Value, CodecError> {
        let [node_document, edge_document] = documents else {
            return Err(CodecError::DocumentCount {
                format: Format::Csv,
                expected: 2,
                actual: documents.len(),
            });
        };

        let nodes = read_rows(node_document)?
            .into_iter()
            .map(|mut row| {
                let mut node = Map::new();
                for column in NODE_COLUMNS {
                    if let Some(cell) = row.remove(column) {
                        node.insert(column.to_string(), Value::String(cell));
                    }
                }
                Value::Object(node)
            })
            .collect();

        let edges = read_rows(edge_document)?
            .into_iter()
            .map(|mut row| {
                let mut edge = Map::new();
                for column in ["source", "target"] {
                    if let Some(cell) = row.remove(column) {
                        edge.insert(column.to_string(), Value::String(cell));
                    }
                }
                if let Some(cell) = row.remove("label") {
                    let labels = split_label(&cell).into_iter().map(Value::String).collect();
                    edge.insert("label".to_string(), Value::Array(labels));
                }
                Value::Object(edge)
            })
            .collect();

        let mut graph = Map::new();
        graph.insert("nodes".to_string(), Value::Array(nodes));
        graph.insert("edges".to_string(), Value::Array(edges));
        Ok(Value::Object(graph))
    }

    fn encode(&self, graph: &Graph, path: &Path) -> Result<Vec<Document>, CodecError> {
        let (node_path, edge_path) = csv_paths(path);

        let nodes = write_rows(
            NODE_COLUMNS,
            graph
                .nodes()
                .map(|node| [node.id.clone(), node.label.clone(), node.node_type.clone()]),
        )?;

        let edges = write_rows(
            EDGE_COLUMNS,
            graph.edges().map(|edge| {
                [
                    edge.source.clone(),
                    edge.target.clone(),
                    join_labels(&edge.label),
                ]
            }),
        )?;

        Ok(vec![
            Document::new(node_path, nodes),
            Document::new(edge_path, edges),
        ])
    }
}

/// Parse a headed CSV document into column→cell maps, skipping empty cells
fn read_rows(document: &Document) -> Result<Vec<HashMap<String, String>>, CodecError> {
    let syntax = |e: ::csv::Error| CodecError::syntax(Format::Csv, &document.path, e);

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(document.contents.as_slice());
    let headers = reader.headers().map_err(syntax)?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(syntax)?;
        let row = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(column, cell)| (column.trim().to_string(), cell.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn write_rows(
    columns: [&str; 3],
    rows: impl Iterator<Item = [String; 3]>,
) -> Result<Vec<u8>, CodecError> {
    let encode = |e: ::csv::Error| CodecError::encode(Format::Csv, e);

    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(columns).map_err(encode)?;
    for row in rows {
        writer.write_record(&row).map_err(encode)?;
    }
    writer
        .into_inner()
        .map_err(|e| CodecError::encode(Format::Csv, e))
}
