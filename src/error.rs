//! Error types for the human-input exchange
//!
//! This module defines the error types used by the exchange core. None of these
//! reach the MCP caller directly: the coordinator turns every failure into text.

use std::fmt;
use std::io;

/// Exchange error types
#[derive(Debug)]
pub enum Error {
    /// I/O errors
    Io(io::Error),

    /// JSON serialization/deserialization errors
    Json(serde_json::Error),

    /// The session workspace could not be created
    Workspace(String),

    /// The request was rejected before anything was launched
    Validation(String),

    /// The request artifact or script could not be written
    Encode(String),

    /// The terminal front-end could not be started
    Launch(String),

    /// Configuration errors
    Config(String),
}

/// Result type for exchange operations
pub type Result<T> = std::result::Result<T, Error>;

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Json(err) => write!(f, "JSON error: {}", err),
            Error::Workspace(msg) => write!(f, "Workspace error: {}", msg),
            Error::Validation(msg) => write!(f, "Validation error: {}", msg),
            Error::Encode(msg) => write!(f, "Encode error: {}", msg),
            Error::Launch(msg) => write!(f, "Launch error: {}", msg),
            Error::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}
