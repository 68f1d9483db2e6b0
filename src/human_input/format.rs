//! Caller-facing text.
//!
//! The caller is an autonomous agent that reads prose, so every outcome of an
//! exchange ends up as one of the strings below. Existing callers match on
//! them, keep them verbatim.

use crate::human_input::types::HumanInputResponse;

/// Returned when nobody answered within the exchange timeout
pub const TIMEOUT_MESSAGE: &str = "The user did not respond within 10 minutes. Continue with your best judgment, or ask again later if the answers are essential.";

/// Returned when no terminal could be opened on this host
pub const LAUNCH_FAILED_MESSAGE: &str = "Could not open a terminal window to ask the user. No interactive terminal is available on this machine, so continue with your best judgment.";

/// Returned when the window closed without a response artifact
pub const NO_RESPONSE_MESSAGE: &str = "The user closed the question window without answering. Continue with your best judgment, or ask again if the answers are essential.";

/// Returned when the caller withdrew the request
pub const CANCELLED_MESSAGE: &str =
    "The request for user input was cancelled before the user answered.";

/// Render collected answers as numbered Q/A blocks
pub fn format_response(response: &HumanInputResponse) -> String {
    let mut text = format!(
        "User responded to {} question(s):\n\n",
        response.answers.len()
    );
    for (index, pair) in response.answers.iter().enumerate() {
        text.push_str(&format!(
            "{}. Q: {}\n   A: {}\n\n",
            index + 1,
            pair.question,
            pair.answer
        ));
    }
    text.trim_end().to_string()
}

/// Text for a response artifact that could not be parsed; the raw content is kept
pub fn format_decode_failure(error: &str, raw: &str) -> String {
    format!(
        "The user's answers could not be read ({}). Raw response:\n{}",
        error, raw
    )
}

/// Text for a request rejected before anything was launched
pub fn format_validation_failure(reason: &str) -> String {
    format!("Cannot ask the user: {}.", reason)
}

/// Text for a failure to write the request artifact or script
pub fn format_encode_failure(error: &str) -> String {
    format!("Could not prepare the question window: {}.", error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::human_input::types::QuestionAnswer;

    #[test]
    fn test_single_answer_format() {
        let response =
            HumanInputResponse::new(vec![QuestionAnswer::new("Postgres or SQLite?", "SQLite")]);
        assert_eq!(
            format_response(&response),
            "User responded to 1 question(s):\n\n1. Q: Postgres or SQLite?\n   A: SQLite"
        );
    }

    #[test]
    fn test_multiple_answers_in_order_with_skipped_slot() {
        let response = HumanInputResponse::new(vec![
            QuestionAnswer::new("First?", "one"),
            QuestionAnswer::new("Second?", ""),
            QuestionAnswer::new("Third?", "three"),
        ]);
        let text = format_response(&response);

        assert_eq!(
            text,
            "User responded to 3 question(s):\n\n\
             1. Q: First?\n   A: one\n\n\
             2. Q: Second?\n   A: \n\n\
             3. Q: Third?\n   A: three"
        );
    }

    #[test]
    fn test_trailing_whitespace_trimmed_on_empty_last_answer() {
        let response = HumanInputResponse::new(vec![QuestionAnswer::new("Skip me?", "")]);
        assert_eq!(
            format_response(&response),
            "User responded to 1 question(s):\n\n1. Q: Skip me?\n   A:"
        );
    }

    #[test]
    fn test_decode_failure_keeps_raw() {
        let text = format_decode_failure("invalid response format: EOF", "{\"answers\": [");
        assert!(text.starts_with("The user's answers could not be read (invalid response format: EOF)."));
        assert!(text.ends_with("{\"answers\": ["));
    }
}
