//! # JSON-RPC 2.0 Types
//!
//! Wire objects for the MCP transport:
//!
//! - `JsonRpcRequest`: a method invocation that expects a response
//! - `JsonRpcResponse`: the result of a method call
//! - `JsonRpcNotification`: a one-way message
//! - `JsonRpcError`: the standard error object
//! - `JsonRpcMessage`: classification of an incoming line
//!
//! ## Example
//!
//! ```rust
//! use mcp_ask_human::mcp::types::{JsonRpcMessage, JsonRpcRequest};
//!
//! let request = JsonRpcRequest::new("tools/list", None, serde_json::json!(1));
//! let bytes = request.to_bytes().unwrap();
//!
//! match JsonRpcMessage::from_slice(&bytes).unwrap() {
//!     JsonRpcMessage::Request(parsed) => assert_eq!(parsed.method, "tools/list"),
//!     JsonRpcMessage::Notification(_) => unreachable!(),
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::error::{McpError, McpResult};

/// JSON-RPC protocol version
pub const JSONRPC_VERSION: &str = "2.0";

/// Parse error code
pub const PARSE_ERROR: i32 = -32700;
/// Invalid request code
pub const INVALID_REQUEST: i32 = -32600;
/// Method not found code
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid params code
pub const INVALID_PARAMS: i32 = -32602;
/// Internal error code
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC 2.0 request object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version, always "2.0"
    pub jsonrpc: String,
    /// Method name to invoke
    pub method: String,
    /// Parameters for the method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Request identifier, echoed in the response
    pub id: Value,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC request
    pub fn new(method: &str, params: Option<Value>, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
            id,
        }
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> McpResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// JSON-RPC 2.0 response object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version, always "2.0"
    pub jsonrpc: String,
    /// Result of a successful call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error of a failed call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Identifier of the request this answers
    pub id: Value,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(result: Value, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response
    pub fn error(error: JsonRpcError, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> McpResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> McpResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| McpError::InvalidMessage(format!("Failed to parse JSON-RPC response: {}", e)))
    }
}

/// JSON-RPC 2.0 notification object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// JSON-RPC version, always "2.0"
    pub jsonrpc: String,
    /// Notification method
    pub method: String,
    /// Notification parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a new notification
    pub fn new(method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
        }
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> McpResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create a new JSON-RPC error
    pub fn new(code: i32, message: &str, data: Option<Value>) -> Self {
        Self {
            code,
            message: message.to_string(),
            data,
        }
    }

    /// Parse error (-32700)
    pub fn parse_error(message: &str) -> Self {
        Self::new(PARSE_ERROR, message, None)
    }

    /// Invalid request error (-32600)
    pub fn invalid_request(message: &str) -> Self {
        Self::new(INVALID_REQUEST, message, None)
    }

    /// Method not found error (-32601)
    pub fn method_not_found(message: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, message, None)
    }

    /// Invalid params error (-32602)
    pub fn invalid_params(message: &str) -> Self {
        Self::new(INVALID_PARAMS, message, None)
    }

    /// Internal error (-32603)
    pub fn internal_error(message: &str) -> Self {
        Self::new(INTERNAL_ERROR, message, None)
    }
}

impl From<&McpError> for JsonRpcError {
    fn from(error: &McpError) -> Self {
        match error {
            McpError::InvalidParams(_) | McpError::NotFound(_) => {
                JsonRpcError::invalid_params(&error.to_string())
            }
            McpError::MethodNotFound(_) => JsonRpcError::method_not_found(&error.to_string()),
            McpError::InvalidMessage(_) => JsonRpcError::invalid_request(&error.to_string()),
            _ => JsonRpcError::internal_error(&error.to_string()),
        }
    }
}

/// An incoming message, classified by shape
#[derive(Debug, Clone)]
pub enum JsonRpcMessage {
    /// Has `method` and `id`
    Request(JsonRpcRequest),
    /// Has `method` but no `id`
    Notification(JsonRpcNotification),
}

impl JsonRpcMessage {
    /// Classify raw bytes.
    ///
    /// Invalid JSON yields [`McpError::Serialization`]. Valid JSON that is neither
    /// a request nor a notification yields [`McpError::InvalidMessage`].
    pub fn from_slice(bytes: &[u8]) -> McpResult<Self> {
        let value: Value = serde_json::from_slice(bytes)?;

        let Some(object) = value.as_object() else {
            return Err(McpError::InvalidMessage(
                "expected a JSON-RPC object".to_string(),
            ));
        };
        if !object.contains_key("method") {
            return Err(McpError::InvalidMessage(
                "message has no method".to_string(),
            ));
        }

        let has_id = object.contains_key("id");
        let message = if has_id {
            serde_json::from_value(value).map(JsonRpcMessage::Request)
        } else {
            serde_json::from_value(value).map(JsonRpcMessage::Notification)
        };
        message.map_err(|e| McpError::InvalidMessage(format!("Invalid JSON-RPC message: {}", e)))
    }

    /// Best-effort `id` of a message that failed classification
    pub fn id_of(bytes: &[u8]) -> Value {
        serde_json::from_slice::<Value>(bytes)
            .ok()
            .and_then(|v| v.get("id").cloned())
            .unwrap_or(Value::Null)
    }
}
