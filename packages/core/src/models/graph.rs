//! Graph Data Structures
//!
//! This module defines the canonical in-memory graph shared by every codec
//! and by the storage layer.
//!
//! # Identity Rules
//!
//! - **Nodes** are keyed by `id`. Inserting a node whose `id` already exists
//!   replaces the earlier node (last-write-wins).
//! - **Edges** are keyed by `(source, target, label)`. Two edges between the
//!   same pair with different label sequences are distinct; an exact
//!   duplicate replaces the earlier edge.
//!
//! Replaced entries keep the position of their first insertion, so export
//! order stays deterministic.
//!
//! # Examples
//!
//! ```rust
//! use graphbridge_core::models::{Edge, Graph, Node};
//!
//! let mut graph = Graph::new();
//! graph.insert_node(Node::new("a", "Claim A"));
//! graph.insert_node(Node::new("b", "Claim B").with_type("evidence"));
//! graph.insert_edge(Edge::new("b", "a", vec!["supports".to_string()]));
//!
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.edge_count(), 1);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Node type assigned when the input does not specify one
pub const DEFAULT_NODE_TYPE: &str = "node";

/// A graph vertex with identity, label and category.
///
/// Fields the model does not know about are kept in `extra` and written
/// back by formats that can hold them (JSON, YAML, and the storage blob).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Identity key, unique within a graph
    pub id: String,

    /// Human-readable text
    pub label: String,

    /// Free-form category tag
    #[serde(rename = "type", default = "default_node_type")]
    pub node_type: String,

    /// Opaque pass-through fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_node_type() -> String {
    DEFAULT_NODE_TYPE.to_string()
}

impl Node {
    /// Create a node with the default type and no extra fields
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            node_type: default_node_type(),
            extra: Map::new(),
        }
    }

    /// Replace the node type
    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = node_type.into();
        self
    }

    /// Attach an extra pass-through field
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// A directed, possibly multi-labeled connection between two node ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,

    /// One or more labels. A bare string is accepted when deserializing and
    /// becomes a one-element sequence.
    #[serde(deserialize_with = "deserialize_labels")]
    pub label: Vec<String>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, label: Vec<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label,
        }
    }

    /// Key under which this edge is deduplicated
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            source: self.source.clone(),
            target: self.target.clone(),
            label: self.label.clone(),
        }
    }
}

/// Identity of an edge: endpoints plus the exact label sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub source: String,
    pub target: String,
    pub label: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LabelShape {
    One(String),
    Many(Vec<String>),
}

fn deserialize_labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LabelShape::deserialize(deserializer)? {
        LabelShape::One(label) => vec![label],
        LabelShape::Many(labels) => labels,
    })
}

/// Canonical graph: keyed, insertion-ordered node and edge sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: IndexMap<String, Node>,
    edges: IndexMap<EdgeKey, Edge>,
}

/// Borrowed document view used by the structural codecs
#[derive(Serialize)]
struct GraphDocument<'a> {
    nodes: Vec<&'a Node>,
    edges: Vec<&'a Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from node and edge sequences, applying last-write-wins
    /// to duplicates.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = Node>,
        edges: impl IntoIterator<Item = Edge>,
    ) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.insert_node(node);
        }
        for edge in edges {
            graph.insert_edge(edge);
        }
        graph
    }

    /// Insert a node, returning the node it replaced if the id was taken
    pub fn insert_node(&mut self, node: Node) -> Option<Node> {
        self.nodes.insert(node.id.clone(), node)
    }

    /// Insert an edge, returning the edge it replaced if the exact
    /// `(source, target, label)` tuple was already present
    pub fn insert_edge(&mut self, edge: Edge) -> Option<Edge> {
        self.edges.insert(edge.key(), edge)
    }

    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl ExactSizeIterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Edges with at least one endpoint that is not a node of this graph
    pub fn dangling_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges
            .values()
            .filter(|edge| !self.contains_node(&edge.source) || !self.contains_node(&edge.target))
    }
}

impl Serialize for Graph {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        GraphDocument {
            nodes: self.nodes.values().collect(),
            edges: self.edges.values().collect(),
        }
        .serialize(serializer)
    }
}
