//! Error types for the merge-on-read engine.

use std::io;

use thiserror::Error;

/// The result type used throughout mergetree.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for read-path operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error raised by the file-format collaborator.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A record could not be decoded.
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// The schema id is unknown to the schema manager.
    #[error("Schema {0} not found")]
    SchemaNotFound(u64),

    /// A table option is missing or malformed.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The merge function cannot honor the requested projection.
    #[error("Unsupported projection: {0}")]
    Projection(String),

    /// An invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not supported by the configured merge engine.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// An internal invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a new corruption error.
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::Corruption(msg.into())
    }

    /// Creates a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Creates a new projection error.
    pub fn projection(msg: impl Into<String>) -> Self {
        Error::Projection(msg.into())
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Creates a new unsupported operation error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Creates a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}
