//! Error types for the shepherd pipeline.

use thiserror::Error;

/// Result type alias using ShepherdError.
pub type Result<T> = std::result::Result<T, ShepherdError>;

/// Errors that can occur in the shepherd pipeline.
#[derive(Error, Debug)]
pub enum ShepherdError {
    /// Caller-supplied input failed a precondition. No upstream call is made.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A model provider (embedding or completion) returned a non-success status.
    #[error("Upstream provider error ({status}): {detail}")]
    Upstream { status: u16, detail: String },

    /// The similarity-search call against the article store failed.
    #[error("Retrieval error: {message}")]
    Retrieval { message: String },

    /// The streaming completion connection failed mid-stream.
    #[error("Stream transport error: {message}")]
    StreamTransport { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ShepherdError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an upstream provider error.
    pub fn upstream(status: u16, detail: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            detail: detail.into(),
        }
    }

    /// Create a retrieval error.
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval {
            message: message.into(),
        }
    }

    /// Create a stream transport error.
    pub fn stream_transport(message: impl Into<String>) -> Self {
        Self::StreamTransport {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the error code for client-facing responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::Retrieval { .. } => "RETRIEVAL_ERROR",
            Self::StreamTransport { .. } => "STREAM_TRANSPORT_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether this error must be rejected before any streaming begins.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
