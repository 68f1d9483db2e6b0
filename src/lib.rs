#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_html_tags)]
#![deny(rustdoc::bare_urls)]
#![deny(clippy::missing_panics_doc)]

//! mcp-ask-human lets an AI agent ask the human at the keyboard a set of
//! questions and get the answers back as text.
//!
//! Every request opens a fresh terminal window running a small interactive
//! script. The script reads the questions from a per-session directory and
//! writes the answers next to them. The exchange waits for the window to close,
//! at most 10 minutes, and can be cancelled by the caller at any time. The
//! session directory is always removed afterwards.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use mcp_ask_human::{HumanExchange, HumanInputRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let exchange = HumanExchange::for_host();
//!     let request = HumanInputRequest::new(
//!         "need db choice",
//!         ["Postgres or SQLite?", "Expected number of users?"],
//!     );
//!
//!     let text = exchange.ask(&request, &CancellationToken::new()).await;
//!     println!("{}", text);
//! }
//! ```

/// MCP tool surface and stdio server
pub mod mcp;

/// Utility modules for error handling
pub mod utils;

/// Configuration management
pub mod config;

/// Logging and metrics
pub mod telemetry;

/// The out-of-process human-response exchange
pub mod human_input;

/// Error types for the exchange
pub mod error;

// Re-export error types
pub use error::Error;
pub use utils::error::{McpError, McpResult};

/// Re-export telemetry types and functions for easier access
pub use telemetry::{add_metric, init_telemetry, span_duration, TelemetryConfig};

/// Re-export human input types for easier access
pub use human_input::{
    ExchangeOutcome, ExchangeReport, ExchangeState, HumanExchange, HumanInputRequest,
    HumanInputResponse, QuestionAnswer, EXCHANGE_TIMEOUT,
};
