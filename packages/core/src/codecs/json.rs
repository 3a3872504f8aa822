//! JSON codec: one document, 1:1 with the graph model.

use crate::codecs::{single_document, CodecError, Document, Format, GraphCodec};
use crate::models::Graph;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

/// Pretty-printed JSON; extra node fields survive the round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[async_trait]
impl GraphCodec for JsonCodec {
    fn format(&self) -> Format {
        Format::Json
    }

    fn decode(&self, documents: &[Document]) -> Result<Value, CodecError> {
        let document = single_document(Format::Json, documents)?;
        serde_json::from_slice(&document.contents)
            .map_err(|e| CodecError::syntax(Format::Json, &document.path, e))
    }

    fn encode(&self, graph: &Graph, path: &Path) -> Result<Vec<Document>, CodecError> {
        let mut contents =
            serde_json::to_vec_pretty(graph).map_err(|e| CodecError::encode(Format::Json, e))?;
        contents.push(b'\n');
        Ok(vec![Document::new(path, contents)])
    }
}
