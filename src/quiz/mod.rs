//! Multiple-choice review: question construction, the session state machine
//! and the stateless ad-hoc mode.

pub mod question;
pub mod random;
pub mod session;

pub use question::{answer_adhoc, build_question, generate_adhoc_question, Card, Question};
pub use random::{RandomSource, ScriptedRandom, StdRandom};
pub use session::{NextOutcome, QuizSession, SessionState, SessionSummary, StartOutcome};

use serde::Serialize;
use thiserror::Error;

use crate::words::{StoreError, Word};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("insufficient-data")]
    InsufficientData,
    #[error("unknown-word: {0}")]
    UnknownWord(String),
    #[error("missing-translation: {0}")]
    MissingTranslation(String),
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientData => "insufficient-data",
            Self::UnknownWord(_) => "unknown-word",
            Self::MissingTranslation(_) => "missing-translation",
        }
    }
}

/// Protocol violations. These indicate a caller bug and are never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionStateError {
    #[error("no session has been started")]
    NotStarted,
    #[error("a session is already in progress")]
    AlreadyInProgress,
    #[error("no question is pending")]
    NoPendingQuestion,
    #[error("current question was already answered")]
    AlreadyAnswered,
    #[error("current question has not been answered")]
    NotAnswered,
    #[error("word {0} is still queued in the running session")]
    WordInSession(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("session state error: {0}")]
    SessionState(#[from] SessionStateError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub word_id: String,
    pub selected: String,
    pub correct_answer: String,
    pub was_correct: bool,
    /// The word after the scheduler ran.
    pub word: Word,
    /// Present when this answer finished the session.
    pub summary: Option<SessionSummary>,
}
