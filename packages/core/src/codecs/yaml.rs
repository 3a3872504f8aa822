//! YAML codec: same structure as JSON, YAML surface syntax.

use crate::codecs::{single_document, CodecError, Document, Format, GraphCodec};
use crate::models::Graph;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

#[async_trait]
impl GraphCodec for YamlCodec {
    fn format(&self) -> Format {
        Format::Yaml
    }

    fn decode(&self, documents: &[Document]) -> Result<Value, CodecError> {
        let document = single_document(Format::Yaml, documents)?;
        serde_yaml::from_slice(&document.contents)
            .map_err(|e| CodecError::syntax(Format::Yaml, &document.path, e))
    }

    fn encode(&self, graph: &Graph, path: &Path) -> Result<Vec<Document>, CodecError> {
        let contents =
            serde_yaml::to_string(graph).map_err(|e| CodecError::encode(Format::Yaml, e))?;
        Ok(vec![Document::new(path, contents)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::JsonCodec;
    use crate::models::{Edge, Node};
    use serde_json::json;

    const SAMPLE: &str = r#"
nodes:
  - id: 1
    label: Taxes should be lowered
    type: claim
  - id: 2
    label: Growth follows tax cuts
    weight: 0.4
edges:
  - source: 2
    target: 1
    label: supports
  - source: 2
    target: 1
    label: [supports, cites]
"#;

    #[test]
    fn test_decode_normalizes_like_json() {
        let graph = YamlCodec
            .decode_graph(&[Document::new("g.yaml", SAMPLE)])
            .unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.node("2").unwrap().node_type, "node");
        assert_eq!(graph.node("2").unwrap().extra.get("weight"), Some(&json!(0.4)));
        assert_eq!(
            graph.edges().next().unwrap().label,
            vec!["supports".to_string()]
        );
    }

    #[test]
    fn test_round_trip() {
        let graph = Graph::from_parts(
            vec![
                Node::new("x", "Multi\nline label").with_extra("tags", json!(["a", "b"])),
                Node::new("y", "yes").with_type("true"),
            ],
            vec![Edge::new("x", "y", vec!["a: b".to_string(), "c".to_string()])],
        );

        let documents = YamlCodec.encode(&graph, Path::new("g.yaml")).unwrap();
        assert_eq!(YamlCodec.decode_graph(&documents).unwrap(), graph);
    }

    #[test]
    fn test_equivalent_to_json_input() {
        let yaml = YamlCodec
            .decode_graph(&[Document::new("g.yaml", SAMPLE)])
            .unwrap();
        let json_documents = JsonCodec.encode(&yaml, Path::new("g.json")).unwrap();
        let json = JsonCodec.decode_graph(&json_documents).unwrap();

        assert_eq!(json, yaml);
    }

    #[test]
    fn test_malformed_yaml() {
        let err = YamlCodec
            .decode(&[Document::new("bad.yaml", "nodes: [unclosed")])
            .unwrap_err();
        assert!(matches!(err, CodecError::Syntax { format: Format::Yaml, .. }));
        assert!(err.to_string().contains("bad.yaml"));
    }
}
