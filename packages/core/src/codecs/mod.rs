//! Format Codecs
//!
//! Each supported interchange format has a codec implementing [`GraphCodec`]:
//!
//! - [`JsonCodec`] - structural mirror of the graph model
//! - [`YamlCodec`] - same structure, YAML syntax
//! - [`CsvCodec`] - `_nodes.csv` / `_edges.csv` table pair (lossy labels)
//! - [`XmlCodec`] - `<graph>` document with attribute/element convention
//!
//! # Architecture
//!
//! A codec works on [`Document`]s, an in-memory file path plus its bytes.
//! `decode` produces the untyped value that [`validate`] turns into a
//! [`Graph`]; `encode` renders a graph into one or more documents. The
//! provided `load`/`save` methods do the file I/O, so the orchestrator never
//! touches the filesystem itself.

mod csv;
mod error;
mod json;
mod xml;
mod yaml;

pub use self::csv::{csv_paths, join_labels, split_label, CsvCodec};
pub use error::{CodecError, UnknownFormatError};
pub use json::JsonCodec;
pub use xml::XmlCodec;
pub use yaml::YamlCodec;

use crate::models::{validate, Graph};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Supported interchange formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Csv,
    Xml,
    Yaml,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Json, Format::Csv, Format::Xml, Format::Yaml];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Csv => "csv",
            Format::Xml => "xml",
            Format::Yaml => "yaml",
        }
    }

    /// Codec implementing this format
    pub fn codec(&self) -> Box<dyn GraphCodec> {
        match self {
            Format::Json => Box::new(JsonCodec),
            Format::Csv => Box::new(CsvCodec),
            Format::Xml => Box::new(XmlCodec),
            Format::Yaml => Box::new(YamlCodec),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = UnknownFormatError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "csv" => Ok(Format::Csv),
            "xml" => Ok(Format::Xml),
            "yaml" | "yml" => Ok(Format::Yaml),
            _ => Err(UnknownFormatError(tag.to_string())),
        }
    }
}

/// A file's path and contents, held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Symmetric encoder/decoder for one interchange format
///
/// Implementations only provide the pure byte-level conversions; reading and
/// writing files is handled by the provided methods.
#[async_trait]
pub trait GraphCodec: Send + Sync {
    fn format(&self) -> Format;

    /// Physical files backing the logical `path`, in the order `decode`
    /// expects them
    fn files_for(&self, path: &Path) -> Vec<PathBuf> {
        vec![path.to_path_buf()]
    }

    /// Parse documents into the untyped pre-validation shape
    fn decode(&self, documents: &[Document]) -> Result<Value, CodecError>;

    /// Render a graph into the documents that make up `path`
    fn encode(&self, graph: &Graph, path: &Path) -> Result<Vec<Document>, CodecError>;

    /// Decode and validate in one step
    fn decode_graph(&self, documents: &[Document]) -> Result<Graph, CodecError> {
        Ok(validate(self.decode(documents)?)?)
    }

    /// Read every file behind `path`, decode it and validate the result
    async fn load(&self, path: &Path) -> Result<Graph, CodecError> {
        let mut documents = Vec::new();
        for file in self.files_for(path) {
            documents.push(read_document(file).await?);
        }
        self.decode_graph(&documents)
    }

    /// Encode `graph` and write every resulting file, returning their paths
    async fn save(&self, graph: &Graph, path: &Path) -> Result<Vec<PathBuf>, CodecError> {
        let documents = self.encode(graph, path)?;
        let mut written = Vec::with_capacity(documents.len());
        for document in documents {
            tokio::fs::write(&document.path, &document.contents)
                .await
                .map_err(|e| CodecError::io(&document.path, e))?;
            tracing::debug!(
                "Wrote {} bytes to {}",
                document.contents.len(),
                document.path.display()
            );
            written.push(document.path);
        }
        Ok(written)
    }
}

async fn read_document(path: PathBuf) -> Result<Document, CodecError> {
    match tokio::fs::read(&path).await {
        Ok(contents) => Ok(Document { path, contents }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CodecError::NotFound { path }),
        Err(e) => Err(CodecError::io(&path, e)),
    }
}

/// The one document a single-file codec works on
pub(crate) fn single_document(
    format: Format,
    documents: &[Document],
) -> Result<&Document, CodecError> {
    match documents {
        [document] => Ok(document),
        _ => Err(CodecError::DocumentCount {
            format,
            expected: 1,
            actual: documents.len(),
        }),
    }
}
