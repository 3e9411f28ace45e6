//! Error types for fatal HED validation conditions
//!
//! Ordinary findings are [`Issue`](crate::diagnostics::Issue) values collected
//! into lists. The types here cover the conditions where no validation can
//! happen at all: a schema that fails to build, an unreadable configuration,
//! or a broken internal invariant.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fatal HED operations
#[derive(Debug, Error)]
pub enum HedError {
    /// The schema description could not be turned into a usable index
    #[error("Schema error: {message}")]
    SchemaError { message: String },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A fatal issue escaped from a parse that could not continue
    #[error("Validation aborted: {0}")]
    Aborted(#[from] crate::diagnostics::IssueError),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Schema,
    Config,
    Io,
    Aborted,
    Internal,
}

impl HedError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            HedError::SchemaError { .. } => ErrorKind::Schema,
            HedError::ConfigError { .. } => ErrorKind::Config,
            HedError::IoError { .. } => ErrorKind::Io,
            HedError::Aborted(_) => ErrorKind::Aborted,
            HedError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error is recoverable (validation of other units can continue)
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Aborted)
    }

    /// Create a schema error
    pub fn schema_error(message: impl Into<String>) -> Self {
        Self::SchemaError {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for HedError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}
