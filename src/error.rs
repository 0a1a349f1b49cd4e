use crate::embedding::EmbeddingError;
use crate::generation::LlmError;
use crate::pipeline::AttemptReport;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for huntsmith
#[derive(Error, Debug)]
pub enum HuntError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// Chunker parameters that can never terminate or cover the text
    #[error("Invalid chunking configuration: max_chars={max_chars}, overlap={overlap}: {message}")]
    ChunkingConfig {
        max_chars: usize,
        overlap: usize,
        message: String,
    },

    /// Embedding service failure (network, quota, model)
    #[error("Embedding service error: {0}")]
    EmbeddingService(#[from] EmbeddingError),

    /// Text-generation service failure (network, quota, API)
    #[error("Generation service error: {0}")]
    GenerationService(#[from] LlmError),

    /// Structured draft could not be parsed from the model output
    #[error("Malformed draft: {0}")]
    MalformedDraft(String),

    /// Every attempt was rejected or malformed
    #[error("Could not generate sufficiently original content after {} attempts", attempts.len())]
    OriginalityExhausted { attempts: Vec<AttemptReport> },

    /// Stored vectors were produced by a different embedding model
    #[error("Embedding model mismatch: store has '{found}', provider is '{expected}'")]
    EmbeddingModelMismatch { expected: String, found: String },

    /// Stored vector length differs from the query vector
    #[error("Chunk {chunk_id} has a {actual}-dimensional vector, query has {expected}")]
    VectorDimensionMismatch {
        chunk_id: i64,
        expected: usize,
        actual: usize,
    },

    /// Stored vector BLOB is not a whole number of f32 values
    #[error("Chunk {chunk_id} has a corrupt vector ({len} bytes)")]
    CorruptVector { chunk_id: i64, len: usize },

    /// A document with identical content is already in the knowledge base
    #[error("Source already ingested as '{title}' ({id})")]
    SourceAlreadyIngested { id: String, title: String },

    /// Knowledge source not found
    #[error("Knowledge source not found: {id}")]
    SourceNotFound { id: String },

    /// Document contained no text to chunk
    #[error("Document is empty: {path}")]
    EmptyDocument { path: PathBuf },

    /// Generation request failed validation
    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for huntsmith operations
pub type Result<T> = std::result::Result<T, HuntError>;
