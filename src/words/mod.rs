pub mod languages;
pub mod models;
pub mod store;

pub use languages::{default_languages, fetch_languages, Language};
pub use models::{NewWord, Word, WordPatch, WordStats, WordsSnapshot};
pub use store::WordStore;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("word not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
