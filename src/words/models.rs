use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scheduler;

pub const SNAPSHOT_VERSION: u32 = 1;
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub wrong_count: u32,
    /// `None` means the word has never been scheduled.
    #[serde(default)]
    pub interval_days: Option<u32>,
    /// `None` means due immediately.
    #[serde(default)]
    pub next_review_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Word {
    /// Trimmed translation, or `None` when missing or blank.
    pub fn translation_text(&self) -> Option<&str> {
        self.translation
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn has_translation(&self) -> bool {
        self.translation_text().is_some()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        scheduler::is_due(self, now)
    }

    pub fn stats_consistent(&self) -> bool {
        self.correct_count.checked_add(self.wrong_count) == Some(self.review_count)
    }
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWord {
    pub text: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl NewWord {
    pub fn new(text: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translation: Some(translation.into()),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }
}

/// Direct edit of a word. Outer `None` leaves the field untouched, inner
/// `None` clears it.
#[derive(Debug, Clone, Default)]
pub struct WordPatch {
    pub text: Option<String>,
    pub translation: Option<Option<String>>,
    pub example: Option<Option<String>>,
    pub topic: Option<Option<String>>,
    pub language: Option<String>,
}

impl WordPatch {
    pub fn translation(value: impl Into<String>) -> Self {
        Self {
            translation: Some(Some(value.into())),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.translation.is_none()
            && self.example.is_none()
            && self.topic.is_none()
            && self.language.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordsSnapshot {
    #[serde(default = "snapshot_version")]
    pub version: u32,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub words: Vec<Word>,
}

impl Default for WordsSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: None,
            words: Vec::new(),
        }
    }
}

fn snapshot_version() -> u32 {
    SNAPSHOT_VERSION
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordStats {
    pub total: usize,
    pub due: usize,
    pub reviewed: usize,
    pub correct: u64,
    pub wrong: u64,
    pub accuracy: u32,
}
