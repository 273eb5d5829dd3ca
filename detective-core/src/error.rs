//! Error types for data detective operations.
//!
//! Errors fall into three groups that surface at different times:
//! - invalid input is rejected before any backend call is made,
//! - backend failures carry the engine's native error after a round trip,
//! - registry state errors (unknown or duplicate sources) come from the
//!   in-memory source registry.
//!
//! Insufficient data and degenerate statistics are not errors; they are
//! encoded in the returned reports.

use thiserror::Error;

/// Main error type for data detective operations.
#[derive(Debug, Error)]
pub enum DetectiveError {
    /// Caller supplied a value that failed validation (identifier, path, enum value)
    #[error("Invalid {label}: {message}")]
    InvalidInput { label: String, message: String },

    /// A source with this alias is already registered
    #[error("Source '{name}' is already registered. Disconnect it first.")]
    SourceExists { name: String },

    /// No source with this alias is registered
    #[error("Source '{name}' is not registered.")]
    UnknownSource { name: String },

    /// The file or directory backing a source does not exist
    #[error("Path not found: {path}")]
    PathNotFound { path: String },

    /// The query engine rejected or failed a statement
    #[error("{context}: {source}")]
    Backend {
        context: String,
        #[source]
        source: duckdb::Error,
    },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Convenience type alias for Results with DetectiveError
pub type Result<T> = std::result::Result<T, DetectiveError>;

impl DetectiveError {
    /// Creates an invalid input error for the named parameter.
    pub fn invalid_input(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            label: label.into(),
            message: message.into(),
        }
    }

    /// Wraps a query engine error with the operation that triggered it.
    pub fn backend(context: impl Into<String>, source: duckdb::Error) -> Self {
        Self::Backend {
            context: context.into(),
            source,
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Stable, machine-readable name of the error category.
    ///
    /// Used as the `error` field of JSON error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "InvalidInput",
            Self::SourceExists { .. } => "SourceExists",
            Self::UnknownSource { .. } => "UnknownSource",
            Self::PathNotFound { .. } => "PathNotFound",
            Self::Backend { .. } => "BackendError",
            Self::Io { .. } => "IoError",
            Self::Serialization { .. } => "SerializationError",
            Self::Configuration { .. } => "ConfigurationError",
        }
    }

    /// Returns true when the error was raised before touching the backend.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

impl From<serde_json::Error> for DetectiveError {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialization {
            context: "JSON encoding".to_string(),
            source,
        }
    }
}
