use thiserror::Error;

/// A specialized Result type for MCP operations.
pub type McpResult<T> = Result<T, McpError>;

/// Represents errors that can occur during MCP protocol operations.
#[derive(Debug, Error)]
pub enum McpError {
    /// Invalid message format or content
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Parameters did not match what the method expects
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// No handler is registered for the method
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// A named entity (tool, request) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A handler failed while running
    #[error("Execution error: {0}")]
    Execution(String),

    /// IO error during read/write operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        McpError::Serialization(err.to_string())
    }
}
