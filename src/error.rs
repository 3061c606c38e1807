// File: src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for encoder operations.
pub type Result<T> = std::result::Result<T, EncodeError>;

#[derive(Error, Debug)]
pub enum EncodeError {
    /// A triad's (grandparent, parent) context has no row in the context table.
    /// The tables do not cover the observed grammar, so the file cannot be encoded.
    #[error("no context row for `{context}`")]
    MissingContext { context: String },

    /// The pre-parsed unit could not be turned into a syntax tree or token stream.
    #[error("ingestion failed: {0}")]
    Ingest(String),

    /// Two files of one batch map to the same stored matrix.
    #[error("output key `{key}` is also claimed by {}", other.display())]
    DuplicateKey { key: String, other: PathBuf },

    /// The index tables are malformed or out of range.
    #[error("invalid index tables: {0}")]
    Config(String),

    /// A stored matrix does not have the fixed shape.
    #[error("matrix at {} has shape {rows}x{cols}", path.display())]
    Shape { path: PathBuf, rows: usize, cols: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl EncodeError {
    /// Whether this error means the index tables need extending, as opposed to
    /// a problem with one input file.
    pub fn is_coverage_gap(&self) -> bool {
        matches!(self, Self::MissingContext { .. })
    }
}
