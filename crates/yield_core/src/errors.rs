//! Error types for the crop yield core

use thiserror::Error;

/// Errors raised while encoding features or handling model artifacts
#[derive(Error, Debug)]
pub enum CoreError {
    /// The manifest names columns the encoder did not produce
    #[error("Column mismatch: missing columns [{}]", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    /// A categorical value outside the known vocabulary
    #[error("Unknown {family} value: {value:?}")]
    UnknownCategory { family: &'static str, value: String },

    /// Model evaluation failed
    #[error("Model evaluation failed: {0}")]
    Model(String),

    /// Model and manifest do not belong to the same training run
    #[error("Model artifact mismatch: {0}")]
    ArtifactMismatch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Artifact encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
