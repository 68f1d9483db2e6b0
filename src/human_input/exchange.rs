//! The human-response exchange.
//!
//! One call to [`HumanExchange::run`] walks the state machine
//!
//! ```text
//! Created -> ScriptWritten -> Launched -> {Completed | TimedOut | Cancelled} -> CleanedUp
//!                          \-> LaunchFailed -> CleanedUp
//! ```
//!
//! Validation and encode failures end the exchange before anything is launched.
//! The session workspace is released on every path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::Error;
use crate::human_input::codec::{decode_response, encode_request, DecodeOutcome};
use crate::human_input::format::{
    format_decode_failure, format_encode_failure, format_response, format_validation_failure,
    CANCELLED_MESSAGE, LAUNCH_FAILED_MESSAGE, NO_RESPONSE_MESSAGE, TIMEOUT_MESSAGE,
};
use crate::human_input::launcher::{LauncherChain, TerminalLauncher, TerminalProcess};
use crate::human_input::script::{write_script, ScriptFlavor};
use crate::human_input::types::{HumanInputRequest, HumanInputResponse};
use crate::human_input::workspace::{default_root, SessionWorkspace};
use crate::telemetry;

/// How long the operator has to answer before the exchange gives up
pub const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// States an exchange passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Workspace acquired
    Created,
    /// Request artifact and script are on disk
    ScriptWritten,
    /// The terminal front-end is running
    Launched,
    /// The front-end exited on its own
    Completed,
    /// The timeout fired first; the front-end was terminated
    TimedOut,
    /// The caller cancelled first
    Cancelled,
    /// No launcher could start the front-end
    LaunchFailed,
    /// Workspace released
    CleanedUp,
}

/// How an exchange ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// The operator answered every question
    Answered(HumanInputResponse),
    /// The front-end ended without writing answers
    NoResponse,
    /// The response artifact could not be parsed
    DecodeFailed {
        /// Raw artifact content
        raw: String,
        /// Parse failure description
        error: String,
    },
    /// Nobody answered in time
    TimedOut,
    /// The caller withdrew the request
    Cancelled,
    /// No terminal could be opened
    LaunchFailed,
    /// The request was rejected before anything happened
    Invalid(String),
    /// The request artifact or script could not be prepared
    EncodeFailed(String),
}

impl ExchangeOutcome {
    /// Caller-facing text for this outcome
    pub fn to_text(&self) -> String {
        match self {
            ExchangeOutcome::Answered(response) => format_response(response),
            ExchangeOutcome::NoResponse => NO_RESPONSE_MESSAGE.to_string(),
            ExchangeOutcome::DecodeFailed { raw, error } => format_decode_failure(error, raw),
            ExchangeOutcome::TimedOut => TIMEOUT_MESSAGE.to_string(),
            ExchangeOutcome::Cancelled => CANCELLED_MESSAGE.to_string(),
            ExchangeOutcome::LaunchFailed => LAUNCH_FAILED_MESSAGE.to_string(),
            ExchangeOutcome::Invalid(reason) => format_validation_failure(reason),
            ExchangeOutcome::EncodeFailed(error) => format_encode_failure(error),
        }
    }

    /// Short label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            ExchangeOutcome::Answered(_) => "answered",
            ExchangeOutcome::NoResponse => "no_response",
            ExchangeOutcome::DecodeFailed { .. } => "decode_failed",
            ExchangeOutcome::TimedOut => "timed_out",
            ExchangeOutcome::Cancelled => "cancelled",
            ExchangeOutcome::LaunchFailed => "launch_failed",
            ExchangeOutcome::Invalid(_) => "invalid",
            ExchangeOutcome::EncodeFailed(_) => "encode_failed",
        }
    }

    /// Whether the operator's answers came back
    pub fn is_answered(&self) -> bool {
        matches!(self, ExchangeOutcome::Answered(_))
    }

    fn from_decode(outcome: DecodeOutcome) -> Self {
        match outcome {
            DecodeOutcome::Answered(response) => ExchangeOutcome::Answered(response),
            DecodeOutcome::Missing => ExchangeOutcome::NoResponse,
            DecodeOutcome::Malformed { raw, error } => ExchangeOutcome::DecodeFailed { raw, error },
        }
    }
}

/// Everything observable about one finished exchange
#[derive(Debug, Clone)]
pub struct ExchangeReport {
    /// Session id, `None` when the exchange ended before a workspace existed
    pub session_id: Option<String>,
    /// How it ended
    pub outcome: ExchangeOutcome,
    /// States visited, in order
    pub transitions: Vec<ExchangeState>,
    /// Whether the front-end process tree was forcibly terminated
    pub terminated: bool,
}

impl ExchangeReport {
    /// Caller-facing text
    pub fn to_text(&self) -> String {
        self.outcome.to_text()
    }
}

enum Race {
    Exited(std::io::Result<std::process::ExitStatus>),
    Cancelled,
    TimedOut,
}

/// Runs exchanges with a fixed launcher, workspace root and timeout.
///
/// Holds no per-exchange state, so one instance can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct HumanExchange {
    launcher: Arc<dyn TerminalLauncher>,
    workspace_root: PathBuf,
    flavor: ScriptFlavor,
    timeout: Duration,
}

impl Default for HumanExchange {
    fn default() -> Self {
        Self::for_host()
    }
}

impl HumanExchange {
    /// Create an exchange using `launcher` and the defaults for everything else
    pub fn new(launcher: Arc<dyn TerminalLauncher>) -> Self {
        Self {
            launcher,
            workspace_root: default_root(),
            flavor: ScriptFlavor::native(),
            timeout: EXCHANGE_TIMEOUT,
        }
    }

    /// Exchange with the host's default launcher chain
    pub fn for_host() -> Self {
        Self::new(Arc::new(LauncherChain::for_host()))
    }

    /// Put session directories under `root` instead of the system temp dir
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    /// Write the front-end script for `flavor`
    pub fn with_flavor(mut self, flavor: ScriptFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Override the timeout. The MCP tool always uses [`EXCHANGE_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Root under which session directories are created
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Current timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the operator and return the caller-facing text. Never fails.
    pub async fn ask(&self, request: &HumanInputRequest, cancel: &CancellationToken) -> String {
        self.run(request, cancel).await.to_text()
    }

    /// Run one exchange to completion
    #[instrument(skip(self, request, cancel), fields(questions = request.questions.len()))]
    pub async fn run(
        &self,
        request: &HumanInputRequest,
        cancel: &CancellationToken,
    ) -> ExchangeReport {
        let _guard = telemetry::span_duration("human_exchange");

        if let Err(e) = request.validate() {
            warn!(error = %e, "Rejected human input request");
            let reason = match e {
                Error::Validation(reason) => reason,
                other => other.to_string(),
            };
            return ExchangeReport {
                session_id: None,
                outcome: ExchangeOutcome::Invalid(reason),
                transitions: Vec::new(),
                terminated: false,
            };
        }

        let mut workspace = match SessionWorkspace::acquire(&self.workspace_root).await {
            Ok(workspace) => workspace,
            Err(e) => {
                warn!(error = %e, "Failed to acquire session workspace");
                return ExchangeReport {
                    session_id: None,
                    outcome: ExchangeOutcome::EncodeFailed(e.to_string()),
                    transitions: Vec::new(),
                    terminated: false,
                };
            }
        };

        let mut report = ExchangeReport {
            session_id: Some(workspace.session_id().to_string()),
            outcome: ExchangeOutcome::NoResponse,
            transitions: vec![ExchangeState::Created],
            terminated: false,
        };

        let outcome = self.drive(request, &workspace, cancel, &mut report).await;
        report.outcome = outcome;

        workspace.cleanup().await;
        report.transitions.push(ExchangeState::CleanedUp);

        info!(
            session_id = ?report.session_id,
            outcome = report.outcome.label(),
            terminated = report.terminated,
            "Human input exchange finished"
        );
        telemetry::add_metric(
            "human_exchange.outcome",
            1.0,
            &[("outcome", report.outcome.label().to_string())],
        );
        report
    }

    async fn drive(
        &self,
        request: &HumanInputRequest,
        workspace: &SessionWorkspace,
        cancel: &CancellationToken,
        report: &mut ExchangeReport,
    ) -> ExchangeOutcome {
        let script = match self.prepare(request, workspace).await {
            Ok(script) => script,
            Err(Error::Validation(reason)) => return ExchangeOutcome::Invalid(reason),
            Err(e) => {
                warn!(error = %e, "Failed to prepare front-end");
                return ExchangeOutcome::EncodeFailed(e.to_string());
            }
        };
        report.transitions.push(ExchangeState::ScriptWritten);

        let mut process = match self.launcher.launch(&script).await {
            Ok(Some(process)) => process.with_pid_file(workspace.pid_path()),
            Ok(None) => {
                report.transitions.push(ExchangeState::LaunchFailed);
                return ExchangeOutcome::LaunchFailed;
            }
            Err(e) => {
                warn!(error = %e, "Terminal launcher failed");
                report.transitions.push(ExchangeState::LaunchFailed);
                return ExchangeOutcome::LaunchFailed;
            }
        };
        report.transitions.push(ExchangeState::Launched);
        debug!(pid = ?process.id(), launcher = process.launcher(), "Waiting for operator");

        match self.race(&mut process, cancel).await {
            Race::Exited(status) => {
                match status {
                    Ok(status) => debug!(?status, "Front-end exited"),
                    Err(e) => warn!(error = %e, "Failed to wait for front-end"),
                }
                report.transitions.push(ExchangeState::Completed);
                ExchangeOutcome::from_decode(
                    decode_response(request, &workspace.response_path()).await,
                )
            }
            Race::TimedOut => {
                warn!(timeout_secs = self.timeout.as_secs(), "Operator did not answer in time");
                report.terminated = process.kill_tree().await;
                report.transitions.push(ExchangeState::TimedOut);
                match decode_response(request, &workspace.response_path()).await {
                    // The operator finished just as the timer fired.
                    DecodeOutcome::Answered(response) => ExchangeOutcome::Answered(response),
                    _ => ExchangeOutcome::TimedOut,
                }
            }
            Race::Cancelled => {
                info!("Human input request cancelled by caller");
                report.transitions.push(ExchangeState::Cancelled);
                ExchangeOutcome::Cancelled
            }
        }
    }

    async fn prepare(
        &self,
        request: &HumanInputRequest,
        workspace: &SessionWorkspace,
    ) -> crate::error::Result<PathBuf> {
        encode_request(request, &workspace.request_path()).await?;
        write_script(workspace, self.flavor).await
    }

    async fn race(&self, process: &mut TerminalProcess, cancel: &CancellationToken) -> Race {
        tokio::select! {
            biased;
            status = process.wait() => Race::Exited(status),
            _ = cancel.cancelled() => Race::Cancelled,
            _ = tokio::time::sleep(self.timeout) => Race::TimedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::human_input::types::QuestionAnswer;

    #[derive(Debug)]
    struct NoTerminal;

    #[async_trait::async_trait]
    impl TerminalLauncher for NoTerminal {
        fn name(&self) -> &str {
            "none"
        }

        async fn launch(&self, _script: &Path) -> crate::error::Result<Option<TerminalProcess>> {
            Ok(None)
        }
    }

    fn exchange(root: &Path) -> HumanExchange {
        HumanExchange::new(Arc::new(NoTerminal)).with_workspace_root(root)
    }

    #[test]
    fn test_outcome_texts() {
        let answered = ExchangeOutcome::Answered(HumanInputResponse::new(vec![
            QuestionAnswer::new("Postgres or SQLite?", "SQLite"),
        ]));
        assert_eq!(
            answered.to_text(),
            "User responded to 1 question(s):\n\n1. Q: Postgres or SQLite?\n   A: SQLite"
        );
        assert_eq!(ExchangeOutcome::TimedOut.to_text(), TIMEOUT_MESSAGE);
        assert_eq!(ExchangeOutcome::Cancelled.to_text(), CANCELLED_MESSAGE);
        assert_eq!(ExchangeOutcome::NoResponse.to_text(), NO_RESPONSE_MESSAGE);
        assert_eq!(ExchangeOutcome::LaunchFailed.to_text(), LAUNCH_FAILED_MESSAGE);
        assert_eq!(
            ExchangeOutcome::Invalid("at least one question is required".to_string()).to_text(),
            "Cannot ask the user: at least one question is required."
        );
    }

    #[test]
    fn test_defaults() {
        let exchange = HumanExchange::new(Arc::new(NoTerminal));
        assert_eq!(exchange.timeout(), Duration::from_secs(600));
        assert_eq!(exchange.workspace_root(), default_root().as_path());
    }

    #[tokio::test]
    async fn test_validation_happens_before_workspace() {
        let root = tempfile::tempdir().unwrap();
        let request = HumanInputRequest::new("reason", Vec::<String>::new());

        let report = exchange(root.path()).run(&request, &CancellationToken::new()).await;

        assert_eq!(
            report.outcome,
            ExchangeOutcome::Invalid("at least one question is required".to_string())
        );
        assert!(report.session_id.is_none());
        assert!(report.transitions.is_empty());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_launch_failure_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let request = HumanInputRequest::new("need db choice", ["Postgres or SQLite?"]);

        let report = exchange(root.path()).run(&request, &CancellationToken::new()).await;

        assert_eq!(report.outcome, ExchangeOutcome::LaunchFailed);
        assert_eq!(
            report.transitions,
            vec![
                ExchangeState::Created,
                ExchangeState::ScriptWritten,
                ExchangeState::LaunchFailed,
                ExchangeState::CleanedUp,
            ]
        );
        assert!(!report.terminated);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unwritable_root_is_reported_as_text() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let request = HumanInputRequest::new("reason", ["q?"]);

        let text = exchange(&blocker).ask(&request, &CancellationToken::new()).await;
        assert!(text.starts_with("Could not prepare the question window: Workspace error:"));
    }
}
