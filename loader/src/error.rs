//! Error types for schema loading.
//!
//! Covers reading input files, parsing JSON and YAML documents, resolving
//! input paths and decoding schema documents. Structural violations are not
//! errors; they are reported through [`FileReport`](crate::FileReport).

use std::path::PathBuf;

use structural_schema_core::DecodeError;
use thiserror::Error;

/// Errors that can occur while loading schema documents.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Input paths could not be resolved to schema files.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A schema document could not be decoded into a schema tree.
    #[error("failed to decode schema '{schema}' in '{}': {source}", .file.display())]
    Decode {
        file: PathBuf,
        schema: String,
        #[source]
        source: DecodeError,
    },
}

/// Convenience alias for results with [`LoaderError`].
pub type Result<T> = std::result::Result<T, LoaderError>;
