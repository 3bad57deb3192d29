//! Backend client error types.

use thiserror::Error;

/// Result type for backend client operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors raised by a [`BackendClient`](super::BackendClient).
///
/// The gateway never inspects these beyond their message: every variant
/// reaching a tool handler is surfaced as an upstream failure.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("Request to OpenProject failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// OpenProject answered with a non-success status.
    #[error("OpenProject returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not the expected HAL document.
    #[error("Invalid response from OpenProject: {0}")]
    InvalidResponse(String),

    /// A page failed after earlier pages had already been collected.
    #[error(
        "Full retrieval aborted at page {offset} after {retrieved} of {total} elements: {source}"
    )]
    IncompleteRetrieval {
        offset: u64,
        retrieved: usize,
        total: u64,
        #[source]
        source: Box<BackendError>,
    },

    /// The client could not be constructed from its configuration.
    #[error("Invalid backend configuration: {0}")]
    Config(String),
}

impl BackendError {
    /// Create a status error.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
