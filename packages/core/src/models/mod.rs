//! Data Models
//!
//! This module contains the canonical graph model used throughout GraphBridge:
//!
//! - `Node`, `Edge`, `Graph` - keyed, insertion-ordered graph structures
//! - `validate` - converts untyped decoded data into a `Graph`
//!
//! Codecs and the storage layer only ever hand typed `Graph` values to each
//! other; the untyped intermediate is confined to validation.

mod graph;
mod validation;

pub use graph::{Edge, EdgeKey, Graph, Node, DEFAULT_NODE_TYPE};
pub use validation::{validate, EntryKind, StructureError};
