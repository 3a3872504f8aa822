//! Structural validation of decoded graph data
//!
//! Codecs decode into an untyped [`serde_json::Value`]. [`validate`] is the
//! only consumer of that shape: it checks the structure, normalizes the
//! loosely-typed fields and produces a [`Graph`].
//!
//! Validation is shallow. It does not check that edge endpoints refer to
//! nodes of the graph.

use crate::models::graph::{Edge, Graph, Node, DEFAULT_NODE_TYPE};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Which collection of the graph an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Node,
    Edge,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Node => write!(f, "Node"),
            EntryKind::Edge => write!(f, "Edge"),
        }
    }
}

/// Input does not have the shape of a graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    #[error("Graph data is not a valid object")]
    NotAnObject,

    #[error("Graph must contain a \"{0}\" array")]
    MissingCollection(&'static str),

    #[error("{kind} at index {index} is not a valid object")]
    InvalidEntry { kind: EntryKind, index: usize },

    #[error("{kind} at index {index} missing required '{field}' field")]
    MissingField {
        kind: EntryKind,
        index: usize,
        field: &'static str,
    },

    #[error("{kind} at index {index} has invalid '{field}' field: {reason}")]
    InvalidField {
        kind: EntryKind,
        index: usize,
        field: &'static str,
        reason: String,
    },
}

impl StructureError {
    fn missing(kind: EntryKind, index: usize, field: &'static str) -> Self {
        Self::MissingField { kind, index, field }
    }

    fn invalid(kind: EntryKind, index: usize, field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            kind,
            index,
            field,
            reason: reason.into(),
        }
    }
}

/// Validate and normalize a decoded graph.
///
/// # Errors
///
/// Returns `StructureError` if:
/// - the input is not an object
/// - `nodes` or `edges` is not an array
/// - a node lacks `id` or a non-empty string `label`
/// - an edge lacks `source`, `target` or `label`
///
/// An identifier counts as present when it is a non-empty string, any
/// number (including `0`) or `true`. Edge labels get no such allowance:
/// `false` and numeric zero count as missing.
///
/// # Examples
///
/// ```rust
/// use graphbridge_core::models::validate;
/// use serde_json::json;
///
/// let graph = validate(json!({
///     "nodes": [{"id": 0, "label": "Root"}],
///     "edges": [{"source": 0, "target": 0, "label": "loops"}]
/// }))
/// .unwrap();
///
/// let node = graph.nodes().next().unwrap();
/// assert_eq!(node.id, "0");
/// assert_eq!(node.node_type, "node");
/// assert_eq!(graph.edges().next().unwrap().label, vec!["loops".to_string()]);
/// ```
pub fn validate(raw: Value) -> Result<Graph, StructureError> {
    let Value::Object(mut root) = raw else {
        return Err(StructureError::NotAnObject);
    };

    let Some(Value::Array(raw_nodes)) = root.remove("nodes") else {
        return Err(StructureError::MissingCollection("nodes"));
    };
    let Some(Value::Array(raw_edges)) = root.remove("edges") else {
        return Err(StructureError::MissingCollection("edges"));
    };

    let mut graph = Graph::new();

    for (index, value) in raw_nodes.into_iter().enumerate() {
        graph.insert_node(validate_node(value, index)?);
    }

    for (index, value) in raw_edges.into_iter().enumerate() {
        graph.insert_edge(validate_edge(value, index)?);
    }

    Ok(graph)
}

fn validate_node(value: Value, index: usize) -> Result<Node, StructureError> {
    let kind = EntryKind::Node;
    let Value::Object(mut fields) = value else {
        return Err(StructureError::InvalidEntry { kind, index });
    };

    let id = take_identifier(&mut fields, kind, index, "id")?;

    let label = match fields.remove("label") {
        Some(Value::String(label)) if !label.is_empty() => label,
        Some(Value::String(_)) | Some(Value::Null) | None => {
            return Err(StructureError::missing(kind, index, "label"))
        }
        Some(other) => {
            return Err(StructureError::invalid(
                kind,
                index,
                "label",
                format!("expected a string, found {}", type_name(&other)),
            ))
        }
    };

    let node_type = match fields.remove("type") {
        None | Some(Value::Null) => DEFAULT_NODE_TYPE.to_string(),
        Some(value) => scalar_to_string(value)
            .map_err(|found| StructureError::invalid(kind, index, "type", found))?,
    };

    Ok(Node {
        id,
        label,
        node_type,
        extra: fields,
    })
}

fn validate_edge(value: Value, index: usize) -> Result<Edge, StructureError> {
    let kind = EntryKind::Edge;
    let Value::Object(mut fields) = value else {
        return Err(StructureError::InvalidEntry { kind, index });
    };

    let source = take_identifier(&mut fields, kind, index, "source")?;
    let target = take_identifier(&mut fields, kind, index, "target")?;

    let label = match fields.remove("label") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => {
            return Err(StructureError::missing(kind, index, "label"))
        }
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => {
            return Err(StructureError::missing(kind, index, "label"))
        }
        Some(Value::String(label)) if label.is_empty() => {
            return Err(StructureError::missing(kind, index, "label"))
        }
        Some(Value::Array(items)) if items.is_empty() => {
            return Err(StructureError::invalid(
                kind,
                index,
                "label",
                "expected at least one label",
            ))
        }
        Some(Value::Array(items)) => items
            .into_iter()
            .map(scalar_to_string)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|found| StructureError::invalid(kind, index, "label", found))?,
        Some(value) => vec![scalar_to_string(value)
            .map_err(|found| StructureError::invalid(kind, index, "label", found))?],
    };

    Ok(Edge {
        source,
        target,
        label,
    })
}

/// Remove an identity field and coerce it to a string.
///
/// Falsy values other than numeric zero count as missing.
fn take_identifier(
    fields: &mut Map<String, Value>,
    kind: EntryKind,
    index: usize,
    field: &'static str,
) -> Result<String, StructureError> {
    match fields.remove(field) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => {
            Err(StructureError::missing(kind, index, field))
        }
        Some(Value::String(s)) if s.is_empty() => Err(StructureError::missing(kind, index, field)),
        Some(value) => scalar_to_string(value)
            .map_err(|found| StructureError::invalid(kind, index, field, found)),
    }
}

/// Textual form of a scalar; structured values are rejected with a message.
fn scalar_to_string(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!(
            "expected a string or number, found {}",
            type_name(&other)
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
