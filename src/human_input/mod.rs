//! Asking a human operator questions out of process.
//!
//! The request is written to a per-session directory, a small interactive script
//! is opened in a new terminal window, and the answers are read back from a
//! response file once the window closes. [`HumanExchange`] drives one such
//! round trip and always produces caller-facing text.

pub mod codec;
pub mod exchange;
pub mod format;
pub mod launcher;
pub mod script;
pub mod workspace;
mod types;

// Re-export key components
pub use codec::DecodeOutcome;
pub use exchange::{
    ExchangeOutcome, ExchangeReport, ExchangeState, HumanExchange, EXCHANGE_TIMEOUT,
};
pub use launcher::{CommandLauncher, LauncherChain, TerminalLauncher, TerminalProcess};
pub use script::ScriptFlavor;
pub use types::{HumanInputRequest, HumanInputResponse, QuestionAnswer};
pub use workspace::SessionWorkspace;
