pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod quiz;
pub mod scheduler;
pub mod trainer;
pub mod words;

pub use client::{ApiClient, ApiError, ApiErrorCode, AuthState, RequestOptions, TokenPair};
pub use config::{ClientConfig, Config};
pub use error::{ErrorKind, TrainerError};
pub use persistence::{JsonFileStore, MemoryStore, PersistenceAdapter, RemoteStore};
pub use quiz::{
    answer_adhoc, generate_adhoc_question, AnswerOutcome, NextOutcome, Question, QuizError,
    QuizSession, SessionState, SessionSummary, StartOutcome,
};
pub use scheduler::{compute_next_schedule, is_due, Clock, Schedule, SystemClock};
pub use trainer::Trainer;
pub use words::{NewWord, Word, WordPatch, WordStore, WordsSnapshot};
