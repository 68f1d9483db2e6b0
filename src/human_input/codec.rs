//! Request and response artifacts exchanged with the terminal front-end.
//!
//! Both artifacts are JSON documents:
//!
//! ```text
//! request.json   {"reason": "...", "questions": ["...", ...]}
//! response.json  {"answers": [{"question": "...", "answer": "..."}, ...]}
//! ```

use std::io;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};
use crate::human_input::types::{HumanInputRequest, HumanInputResponse};

/// Result of reading the response artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// The artifact was present and matched the request
    Answered(HumanInputResponse),

    /// No artifact: the front-end ended without writing answers
    Missing,

    /// The artifact exists but could not be used; `raw` keeps its content verbatim
    Malformed {
        /// Raw artifact text
        raw: String,
        /// What was wrong with it
        error: String,
    },
}

#[derive(Debug, Deserialize)]
struct ResponseArtifact {
    answers: Vec<ArtifactAnswer>,
}

#[derive(Debug, Deserialize)]
struct ArtifactAnswer {
    #[serde(default)]
    #[allow(dead_code)]
    question: String,
    answer: String,
}

/// Serialize a request into the JSON document the front-end reads.
pub fn encode_request_json(request: &HumanInputRequest) -> Result<String> {
    request.validate()?;
    serde_json::to_string_pretty(request)
        .map_err(|e| Error::Encode(format!("failed to serialize request: {}", e)))
}

/// Validate the request and write the request artifact to `path`.
#[instrument(skip(request), fields(questions = request.questions.len()))]
pub async fn encode_request(request: &HumanInputRequest, path: &Path) -> Result<()> {
    let json = encode_request_json(request)?;
    tokio::fs::write(path, json).await.map_err(|e| {
        Error::Encode(format!(
            "failed to write request artifact {}: {}",
            path.display(),
            e
        ))
    })?;
    debug!(path = %path.display(), "Wrote request artifact");
    Ok(())
}

/// Parse a request artifact back into a request.
pub fn decode_request_json(json: &str) -> Result<HumanInputRequest> {
    Ok(serde_json::from_str(json)?)
}

/// Interpret the raw bytes of a response artifact for `request`.
pub fn decode_response_bytes(request: &HumanInputRequest, bytes: &[u8]) -> DecodeOutcome {
    let (raw, escaped) = match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), false),
        Err(_) => (bytes.escape_ascii().to_string(), true),
    };

    let artifact: ResponseArtifact = match serde_json::from_slice(bytes) {
        Ok(artifact) => artifact,
        Err(e) => {
            let mut error = format!("invalid response format: {}", e);
            if escaped {
                error.push_str("; the content is not valid UTF-8 and is shown with byte escapes");
            }
            return DecodeOutcome::Malformed { raw, error };
        }
    };

    let answer_count = artifact.answers.len();
    match HumanInputResponse::from_positional(
        request,
        artifact.answers.into_iter().map(|a| a.answer),
    ) {
        Some(response) => DecodeOutcome::Answered(response),
        None => DecodeOutcome::Malformed {
            raw,
            error: format!(
                "expected {} answer(s) but found {}",
                request.questions.len(),
                answer_count
            ),
        },
    }
}

/// Read and decode the response artifact at `path`.
#[instrument(skip(request))]
pub async fn decode_response(request: &HumanInputRequest, path: &Path) -> DecodeOutcome {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let outcome = decode_response_bytes(request, &bytes);
            if let DecodeOutcome::Malformed { error, .. } = &outcome {
                warn!(path = %path.display(), error = %error, "Response artifact is malformed");
            }
            outcome
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No response artifact");
            DecodeOutcome::Missing
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read response artifact");
            DecodeOutcome::Malformed {
                raw: String::new(),
                error: format!("failed to read response artifact: {}", e),
            }
        }
    }
}
