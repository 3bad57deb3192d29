//! Tool-specific error types.

use thiserror::Error;

use crate::domains::openproject::BackendError;

/// Result type for tool handlers.
pub type ToolResult<T> = Result<T, ToolError>;

/// The uniform failure of a tool call.
///
/// Client errors are raised before the backend is contacted; `Upstream`
/// wraps whatever the backend client reported, without trying to tell
/// upstream 4xx and 5xx causes apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// A required parameter was absent.
    #[error("{0} is required")]
    MissingParameter(String),

    /// A parameter was present but malformed.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// `/query` named a tool outside its allow-list.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// `/tools/{operation}` named no known operation.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// The backend client failed.
    #[error("{0}")]
    Upstream(String),
}

impl ToolError {
    /// Create a new "missing parameter" error.
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter(name.into())
    }

    /// Create a new "invalid parameter" error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create a new upstream error from a backend failure.
    pub fn upstream(error: &BackendError) -> Self {
        Self::Upstream(error.to_string())
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingParameter(_) | Self::InvalidParameter(_) | Self::UnknownTool(_) => 400,
            Self::UnknownOperation(_) => 404,
            Self::Upstream(_) => 500,
        }
    }

    /// Whether the caller is at fault.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ToolError::missing("project_id").status_code(), 400);
        assert_eq!(ToolError::invalid("x").status_code(), 400);
        assert_eq!(ToolError::UnknownTool("x".into()).status_code(), 400);
        assert_eq!(ToolError::UnknownOperation("x".into()).status_code(), 404);
        assert_eq!(ToolError::Upstream("boom".into()).status_code(), 500);
        assert!(!ToolError::Upstream("boom".into()).is_client_error());
    }

    #[test]
    fn test_messages() {
        assert_eq!(ToolError::missing("project_id").to_string(), "project_id is required");
        assert_eq!(
            ToolError::UnknownTool("drop_tables".into()).to_string(),
            "Unknown tool: drop_tables"
        );
        let upstream = ToolError::upstream(&BackendError::status(404, "Not found"));
        assert_eq!(upstream.to_string(), "OpenProject returned HTTP 404: Not found");
    }
}
