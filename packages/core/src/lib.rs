//! GraphBridge Core
//!
//! Moves labeled graphs between interchange formats and an embedded store:
//! JSON, CSV, XML or YAML in, a libsql database in the middle, any of the
//! four formats back out.
//!
//! # Architecture
//!
//! - **One canonical model**: every codec decodes to an untyped value that
//!   [`models::validate`] turns into a [`models::Graph`]
//! - **Replace, never fail, on duplicates**: node ids and exact edge tuples
//!   are last-write-wins, both in memory and in storage
//! - **Atomic imports**: a graph is written in a single transaction
//! - **libsql**: embedded SQLite-compatible database
//!
//! # Modules
//!
//! - [`models`] - Graph, Node, Edge and structural validation
//! - [`codecs`] - Format codecs behind the `GraphCodec` trait
//! - [`db`] - Database layer with libsql integration
//! - [`services`] - Import/export orchestration
//! - [`config`] - Explicit runtime configuration

pub mod codecs;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use codecs::{CodecError, Format, GraphCodec};
pub use config::{ConfigError, GraphBridgeConfig};
pub use db::{DanglingEdgePolicy, DatabaseError, GraphStore, StoreCounts};
pub use models::*;
pub use services::*;
