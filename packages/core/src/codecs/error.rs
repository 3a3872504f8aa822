//! Codec Error Types

use crate::codecs::Format;
use crate::models::StructureError;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading, parsing, rendering or writing a format
#[derive(Error, Debug)]
pub enum CodecError {
    /// Input file does not exist
    #[error("Input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Any other filesystem failure
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Bytes are not valid for the format
    #[error("Malformed {format} in {}: {message}", path.display())]
    Syntax {
        format: Format,
        path: PathBuf,
        message: String,
    },

    /// Graph could not be rendered
    #[error("Failed to encode {format}: {message}")]
    Encode { format: Format, message: String },

    /// Codec was handed the wrong number of documents
    #[error("{format} codec expects {expected} document(s), got {actual}")]
    DocumentCount {
        format: Format,
        expected: usize,
        actual: usize,
    },

    /// Decoded data does not have the shape of a graph
    #[error(transparent)]
    Structure(#[from] StructureError),
}

impl CodecError {
    /// Create a syntax error for `path`
    pub fn syntax(format: Format, path: &Path, message: impl fmt::Display) -> Self {
        Self::Syntax {
            format,
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Create an encode error
    pub fn encode(format: Format, message: impl fmt::Display) -> Self {
        Self::Encode {
            format,
            message: message.to_string(),
        }
    }

    /// Create an I/O error for `path`
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Format tag that names no supported codec
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown format '{0}' (expected one of: json, csv, xml, yaml)")]
pub struct UnknownFormatError(pub String);
