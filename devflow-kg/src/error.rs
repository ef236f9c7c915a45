//! Error types for knowledge graph operations
//!
//! Public graph operations follow a "never block the caller" policy and
//! swallow I/O failures after logging them. The variants here are returned
//! by internal helpers, configuration validation, and the explicit
//! persistence health check.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for knowledge graph operations
#[derive(Error, Debug)]
pub enum KgError {
    /// Filesystem error while reading or writing a record
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Operation exceeded its time budget
    #[error("Operation timed out after {timeout_ms}ms: {context}")]
    TimeoutError { timeout_ms: u64, context: String },

    /// One or more writes failed; in-memory state is ahead of disk
    #[error("Persistence degraded: {failures} write(s) failed since startup")]
    PersistenceDegraded { failures: u64 },

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

impl KgError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KgError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for knowledge graph operations
pub type Result<T> = std::result::Result<T, KgError>;

impl From<String> for KgError {
    fn from(s: String) -> Self {
        KgError::Other(s)
    }
}

impl From<&str> for KgError {
    fn from(s: &str) -> Self {
        KgError::Other(s.to_string())
    }
}
