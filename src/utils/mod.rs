//! Shared helpers for the protocol layer.

/// Protocol error types
pub mod error;
