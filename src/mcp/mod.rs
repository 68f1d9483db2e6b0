//! Model Context Protocol surface.
//!
//! The server speaks JSON-RPC 2.0 over newline-delimited stdio and hosts a
//! single tool, `ask_user`, which runs a [`HumanExchange`](crate::human_input::HumanExchange).
//!
//! - `types`: JSON-RPC request, response, notification and error objects
//! - `jsonrpc`: async method registry with per-request cancellation
//! - `tools`: tool definitions and the `ask_user` provider
//! - `server`: the stdio transport loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use mcp_ask_human::mcp::server::McpServer;
//! use mcp_ask_human::mcp::tools::AskUserTool;
//! use std::sync::Arc;
//!
//! async fn example() -> mcp_ask_human::McpResult<()> {
//!     let server = McpServer::new(Arc::new(AskUserTool::default())).await;
//!     let stdin = tokio::io::BufReader::new(tokio::io::stdin());
//!     server.serve(stdin, tokio::io::stdout()).await
//! }
//! ```

/// JSON-RPC 2.0 wire types
pub mod types;

/// JSON-RPC method dispatch
pub mod jsonrpc;

/// Tool system for model actions
pub mod tools;

/// Stdio transport
pub mod server;
