#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mcp_ask_human::human_input::format::{
    CANCELLED_MESSAGE, LAUNCH_FAILED_MESSAGE, NO_RESPONSE_MESSAGE, TIMEOUT_MESSAGE,
};
use mcp_ask_human::human_input::{CommandLauncher, LauncherChain, TerminalLauncher};
use mcp_ask_human::{ExchangeOutcome, ExchangeState, HumanExchange, HumanInputRequest};
use tokio_util::sync::CancellationToken;

/// Launcher that runs `/bin/sh -c <snippet> sh <script>`, so `$1` is the script path
fn sh_launcher(snippet: &str) -> Arc<dyn TerminalLauncher> {
    Arc::new(CommandLauncher::new("fake-sh", "/bin/sh", ["-c", snippet, "sh"]))
}

fn exchange(root: &Path, snippet: &str) -> HumanExchange {
    HumanExchange::new(sh_launcher(snippet)).with_workspace_root(root)
}

fn assert_no_leaked_sessions(root: &Path) {
    let leftovers: Vec<_> = std::fs::read_dir(root)
        .map(|entries| entries.map(|e| e.unwrap().path()).collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty(), "leaked session directories: {:?}", leftovers);
}

fn db_request() -> HumanInputRequest {
    HumanInputRequest::new("need db choice", ["Postgres or SQLite?"])
}

#[tokio::test]
async fn test_single_answer_is_formatted() {
    let root = tempfile::tempdir().unwrap();
    let snippet = r#"dir=$(dirname "$1")
test -f "$dir/request.json" || exit 3
test -f "$1" || exit 4
printf '%s' '{"answers":[{"question":"Postgres or SQLite?","answer":"SQLite"}]}' > "$dir/response.json""#;

    let text = exchange(root.path(), snippet)
        .ask(&db_request(), &CancellationToken::new())
        .await;

    assert_eq!(
        text,
        "User responded to 1 question(s):\n\n1. Q: Postgres or SQLite?\n   A: SQLite"
    );
    assert_no_leaked_sessions(root.path());
}

#[tokio::test]
async fn test_answers_pair_with_questions_in_order() {
    let root = tempfile::tempdir().unwrap();
    let snippet = r#"printf '%s' '{"answers":[{"answer":"SQLite"},{"answer":""}]}' > "$(dirname "$1")/response.json""#;
    let request = HumanInputRequest::new("need db choice", ["Postgres or SQLite?", "Port?"]);

    let report = exchange(root.path(), snippet)
        .run(&request, &CancellationToken::new())
        .await;

    assert_eq!(
        report.transitions,
        vec![
            ExchangeState::Created,
            ExchangeState::ScriptWritten,
            ExchangeState::Launched,
            ExchangeState::Completed,
            ExchangeState::CleanedUp,
        ]
    );
    match &report.outcome {
        ExchangeOutcome::Answered(response) => {
            assert_eq!(response.answers[0].question, "Postgres or SQLite?");
            assert_eq!(response.answers[0].answer, "SQLite");
            assert_eq!(response.answers[1].question, "Port?");
            assert_eq!(response.answers[1].answer, "");
        }
        other => panic!("Expected answers, got: {:?}", other),
    }
    assert!(report.session_id.as_deref().is_some_and(|id| id.len() == 32));
    assert!(!report.terminated);
    assert_no_leaked_sessions(root.path());
}

#[tokio::test]
async fn test_window_closed_without_answers() {
    let root = tempfile::tempdir().unwrap();
    let report = exchange(root.path(), "exit 1")
        .run(&db_request(), &CancellationToken::new())
        .await;

    assert_eq!(report.outcome, ExchangeOutcome::NoResponse);
    assert_eq!(report.to_text(), NO_RESPONSE_MESSAGE);
    assert_no_leaked_sessions(root.path());
}

#[tokio::test]
async fn test_malformed_response_keeps_raw_content() {
    let root = tempfile::tempdir().unwrap();
    let snippet = r#"printf '%s' 'SQLite, obviously' > "$(dirname "$1")/response.json""#;

    let text = exchange(root.path(), snippet)
        .ask(&db_request(), &CancellationToken::new())
        .await;

    assert!(text.starts_with("The user's answers could not be read ("));
    assert!(text.ends_with("Raw response:\nSQLite, obviously"));
    assert_no_leaked_sessions(root.path());
}

#[tokio::test]
async fn test_answer_count_mismatch_is_decode_failure() {
    let root = tempfile::tempdir().unwrap();
    let snippet = r#"printf '%s' '{"answers":[]}' > "$(dirname "$1")/response.json""#;

    let report = exchange(root.path(), snippet)
        .run(&db_request(), &CancellationToken::new())
        .await;

    match report.outcome {
        ExchangeOutcome::DecodeFailed { raw, error } => {
            assert_eq!(raw, r#"{"answers":[]}"#);
            assert_eq!(error, "expected 1 answer(s) but found 0");
        }
        other => panic!("Expected decode failure, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_terminates_front_end_once() {
    let root = tempfile::tempdir().unwrap();
    let request = HumanInputRequest::new("need db choice", ["Postgres or SQLite?", "Users?"]);
    let exchange = exchange(root.path(), "sleep 30 & sleep 30").with_timeout(Duration::from_millis(300));

    let started = Instant::now();
    let report = exchange.run(&request, &CancellationToken::new()).await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(report.outcome, ExchangeOutcome::TimedOut);
    assert_eq!(report.to_text(), TIMEOUT_MESSAGE);
    assert!(report.terminated);
    assert_eq!(
        report.transitions,
        vec![
            ExchangeState::Created,
            ExchangeState::ScriptWritten,
            ExchangeState::Launched,
            ExchangeState::TimedOut,
            ExchangeState::CleanedUp,
        ]
    );
    assert_no_leaked_sessions(root.path());
}

#[tokio::test]
async fn test_half_written_answer_at_timeout_is_timeout() {
    let root = tempfile::tempdir().unwrap();
    let snippet = r#"printf '%s' '{"answers":[{"answer":"SQ' > "$(dirname "$1")/response.json"
sleep 30"#;
    let exchange = exchange(root.path(), snippet).with_timeout(Duration::from_millis(300));

    let report = exchange.run(&db_request(), &CancellationToken::new()).await;

    assert_eq!(report.outcome, ExchangeOutcome::TimedOut);
    assert_eq!(report.to_text(), TIMEOUT_MESSAGE);
    assert!(report.terminated);
    assert_no_leaked_sessions(root.path());
}

#[tokio::test]
async fn test_answer_written_before_timeout_still_counts() {
    let root = tempfile::tempdir().unwrap();
    let snippet = r#"printf '%s' '{"answers":[{"answer":"SQLite"}]}' > "$(dirname "$1")/response.json"
sleep 30"#;
    let exchange = exchange(root.path(), snippet).with_timeout(Duration::from_millis(500));

    let report = exchange.run(&db_request(), &CancellationToken::new()).await;

    assert!(report.terminated);
    assert!(report.outcome.is_answered());
    assert_no_leaked_sessions(root.path());
}

#[tokio::test]
async fn test_cancellation_wins_over_waiting() {
    let root = tempfile::tempdir().unwrap();
    let exchange = exchange(root.path(), "sleep 5");
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let report = exchange.run(&db_request(), &cancel).await;

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(report.outcome, ExchangeOutcome::Cancelled);
    assert_eq!(report.to_text(), CANCELLED_MESSAGE);
    assert!(!report.terminated);
    assert!(report.transitions.contains(&ExchangeState::Cancelled));
    assert_no_leaked_sessions(root.path());
}

#[tokio::test]
async fn test_no_terminal_available() {
    let root = tempfile::tempdir().unwrap();
    let chain = LauncherChain::new(vec![Box::new(CommandLauncher::new(
        "missing",
        "definitely-not-a-terminal-emulator-4f1c",
        ["-e"],
    ))]);
    let exchange = HumanExchange::new(Arc::new(chain)).with_workspace_root(root.path());

    let report = exchange.run(&db_request(), &CancellationToken::new()).await;

    assert_eq!(report.outcome, ExchangeOutcome::LaunchFailed);
    assert_eq!(report.to_text(), LAUNCH_FAILED_MESSAGE);
    assert!(report.transitions.contains(&ExchangeState::LaunchFailed));
    assert!(!report.transitions.contains(&ExchangeState::Launched));
    assert_no_leaked_sessions(root.path());
}

#[tokio::test]
async fn test_invalid_request_touches_nothing() {
    let root = tempfile::tempdir().unwrap();
    let request = HumanInputRequest::new("need db choice", ["Postgres or SQLite?", "   "]);

    let text = exchange(root.path(), "exit 0")
        .ask(&request, &CancellationToken::new())
        .await;

    assert_eq!(text, "Cannot ask the user: question 2 must not be empty.");
    assert_no_leaked_sessions(root.path());
}

#[tokio::test]
async fn test_concurrent_exchanges_are_isolated() {
    let root = tempfile::tempdir().unwrap();
    let snippet = r#"dir=$(dirname "$1")
answer=$(basename "$dir")
printf '{"answers":[{"answer":"%s"}]}' "$answer" > "$dir/response.json""#;
    let exchange = exchange(root.path(), snippet);
    let request = db_request();
    let cancel = CancellationToken::new();

    let (first, second) = tokio::join!(
        exchange.run(&request, &cancel),
        exchange.run(&request, &cancel)
    );

    let answer_of = |outcome: &ExchangeOutcome| match outcome {
        ExchangeOutcome::Answered(response) => response.answers[0].answer.clone(),
        other => panic!("Expected answers, got: {:?}", other),
    };
    assert_eq!(Some(answer_of(&first.outcome)), first.session_id);
    assert_eq!(Some(answer_of(&second.outcome)), second.session_id);
    assert_ne!(first.session_id, second.session_id);
    assert_no_leaked_sessions(root.path());
}

fn has_python() -> bool {
    which::which("python3").is_ok()
}

#[tokio::test]
async fn test_generated_script_records_typed_answers() {
    if !has_python() {
        return;
    }
    let root = tempfile::tempdir().unwrap();
    let snippet = r#"printf 'SQLite\n\n' | python3 "$1""#;
    let request = HumanInputRequest::new("need db choice", ["Postgres or SQLite?", "Port?"]);

    let text = exchange(root.path(), snippet)
        .ask(&request, &CancellationToken::new())
        .await;

    assert_eq!(
        text,
        "User responded to 2 question(s):\n\n1. Q: Postgres or SQLite?\n   A: SQLite\n\n2. Q: Port?\n   A:"
    );
    assert_no_leaked_sessions(root.path());
}

#[tokio::test]
async fn test_generated_script_without_input_records_nothing() {
    if !has_python() {
        return;
    }
    let root = tempfile::tempdir().unwrap();

    let report = exchange(root.path(), r#"python3 "$1" < /dev/null"#)
        .run(&db_request(), &CancellationToken::new())
        .await;

    assert_eq!(report.outcome, ExchangeOutcome::NoResponse);
    assert_eq!(report.to_text(), NO_RESPONSE_MESSAGE);
    assert_no_leaked_sessions(root.path());
}
