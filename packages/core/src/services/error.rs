//! Service Layer Error Types
//!
//! [`TransferError`] is what the orchestrator returns. Each lower layer's
//! error converts into it, so callers can match on the kind of failure
//! without digging into codec or storage details.

use crate::codecs::{CodecError, UnknownFormatError};
use crate::config::ConfigError;
use crate::db::DatabaseError;
use crate::models::StructureError;
use std::path::PathBuf;
use thiserror::Error;

/// Import/export operation errors
#[derive(Error, Debug)]
pub enum TransferError {
    /// Format tag names no codec
    #[error(transparent)]
    UnknownFormat(#[from] UnknownFormatError),

    /// Input file does not exist
    #[error("Input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Decoded data is not a valid graph
    #[error("Invalid graph: {0}")]
    Structure(#[from] StructureError),

    /// Reading, parsing, rendering or writing a format failed
    #[error(transparent)]
    Codec(CodecError),

    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    /// Configuration rejected before anything was opened
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl From<CodecError> for TransferError {
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::NotFound { path } => Self::NotFound { path },
            CodecError::Structure(e) => Self::Structure(e),
            other => Self::Codec(other),
        }
    }
}
