use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A set of questions to put in front of the human operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanInputRequest {
    /// Why the caller needs input
    pub reason: String,

    /// Questions in display order; answers come back in the same order
    pub questions: Vec<String>,
}

impl HumanInputRequest {
    /// Create a new human input request
    pub fn new<I, S>(reason: impl Into<String>, questions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reason: reason.into(),
            questions: questions.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a question at the end of the list
    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.questions.push(question.into());
        self
    }

    /// Number of questions (and therefore expected answers)
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the request has no questions
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Check the request before any filesystem or process work happens
    pub fn validate(&self) -> Result<()> {
        if self.questions.is_empty() {
            return Err(Error::Validation(
                "at least one question is required".to_string(),
            ));
        }
        if self.reason.trim().is_empty() {
            return Err(Error::Validation("the reason must not be empty".to_string()));
        }
        if let Some(index) = self.questions.iter().position(|q| q.trim().is_empty()) {
            return Err(Error::Validation(format!(
                "question {} must not be empty",
                index + 1
            )));
        }
        Ok(())
    }
}

/// One question paired with the operator's answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    /// The question as it was asked
    pub question: String,

    /// The answer; empty when the operator skipped the question
    pub answer: String,
}

impl QuestionAnswer {
    /// Create a new question/answer pair
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Answers collected by the terminal front-end, in question order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanInputResponse {
    /// Positional answers; `answers[i]` belongs to question `i`
    pub answers: Vec<QuestionAnswer>,
}

impl HumanInputResponse {
    /// Create a response from already paired answers
    pub fn new(answers: Vec<QuestionAnswer>) -> Self {
        Self { answers }
    }

    /// Pair answers with the request's questions by position.
    ///
    /// Returns `None` when the number of answers does not match the number of questions.
    pub fn from_positional<I, S>(request: &HumanInputRequest, answers: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let answers: Vec<String> = answers.into_iter().map(Into::into).collect();
        if answers.len() != request.questions.len() {
            return None;
        }
        Some(Self {
            answers: request
                .questions
                .iter()
                .zip(answers)
                .map(|(question, answer)| QuestionAnswer::new(question.clone(), answer))
                .collect(),
        })
    }

    /// Number of answered slots
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Whether there are no answers
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}
