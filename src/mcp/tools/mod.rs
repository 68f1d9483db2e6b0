//! # MCP Tools
//!
//! Tool definitions, results, and the binding of a [`ToolsProvider`] to the
//! `tools/list` and `tools/call` JSON-RPC methods. The only provider shipped
//! here is [`AskUserTool`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mcp_ask_human::mcp::jsonrpc::JsonRpcHandler;
//! use mcp_ask_human::mcp::tools::{AskUserTool, ToolsHandler};
//! use std::sync::Arc;
//!
//! async fn example() {
//!     let jsonrpc = JsonRpcHandler::new();
//!     let handler = ToolsHandler::new(Arc::new(AskUserTool::default()));
//!     handler.register_methods(&jsonrpc).await;
//! }
//! ```

mod ask_user;
mod handler;
mod models;

// Re-export the public API
pub use ask_user::{AskUserTool, ASK_USER_TOOL_NAME};
pub use handler::{
    CallToolParams, ListToolsParams, ListToolsResponse, ToolsCapabilities, ToolsHandler,
    ToolsProvider,
};
pub use models::{Tool, ToolResult, ToolResultContent};
