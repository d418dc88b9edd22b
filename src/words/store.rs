use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::persistence::{PersistenceAdapter, PersistenceError};
use crate::scheduler;
use crate::words::models::{
    NewWord, Word, WordPatch, WordStats, WordsSnapshot, DEFAULT_LANGUAGE, SNAPSHOT_VERSION,
};
use crate::words::StoreError;

/// In-memory vocabulary snapshot plus the primitives the quiz engine needs.
#[derive(Debug, Clone, Default)]
pub struct WordStore {
    words: Vec<Word>,
}

impl WordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a persisted snapshot, dropping duplicate ids and
    /// repairing review counters that disagree with their parts.
    pub fn from_snapshot(snapshot: WordsSnapshot) -> Self {
        let mut words: Vec<Word> = Vec::with_capacity(snapshot.words.len());
        for mut word in snapshot.words {
            if words.iter().any(|existing| existing.id == word.id) {
                warn!(word_id = %word.id, "duplicate word id in snapshot, keeping first");
                continue;
            }
            if !word.stats_consistent() {
                warn!(
                    word_id = %word.id,
                    review_count = word.review_count,
                    "review counters out of sync, recomputing"
                );
                match word.correct_count.checked_add(word.wrong_count) {
                    Some(total) => word.review_count = total,
                    None => {
                        word.wrong_count = u32::MAX - word.correct_count;
                        word.review_count = u32::MAX;
                    }
                }
            }
            words.push(word);
        }
        Self { words }
    }

    /// Loads through `adapter`; any failure yields an empty store.
    pub async fn load(adapter: &dyn PersistenceAdapter) -> Self {
        match adapter.load().await {
            Ok(snapshot) => {
                debug!(count = snapshot.words.len(), "word snapshot loaded");
                Self::from_snapshot(snapshot)
            }
            Err(err) => {
                warn!(error = %err, "failed to load word snapshot, starting empty");
                Self::new()
            }
        }
    }

    pub async fn save(
        &self,
        adapter: &dyn PersistenceAdapter,
        now: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        adapter.save(&self.snapshot(now)).await
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> WordsSnapshot {
        WordsSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Some(now),
            words: self.words.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn get(&self, id: &str) -> Option<&Word> {
        self.words.iter().find(|word| word.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Word, StoreError> {
        self.words
            .iter_mut()
            .find(|word| word.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn add_word(&mut self, input: NewWord, now: DateTime<Utc>) -> Result<Word, StoreError> {
        let text = input.text.trim();
        if text.is_empty() {
            return Err(StoreError::InvalidInput("word text is empty".to_string()));
        }

        let language = input
            .language
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string();

        let word = Word {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            translation: normalize_optional(input.translation),
            example: normalize_optional(input.example),
            topic: normalize_optional(input.topic),
            language,
            review_count: 0,
            correct_count: 0,
            wrong_count: 0,
            interval_days: None,
            next_review_at: None,
            last_reviewed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.words.push(word.clone());
        Ok(word)
    }

    /// Inserts a word that already has an identity, e.g. one returned by the
    /// remote store. Replaces any entry with the same id.
    pub fn upsert(&mut self, word: Word) {
        match self.words.iter_mut().find(|existing| existing.id == word.id) {
            Some(existing) => *existing = word,
            None => self.words.push(word),
        }
    }

    pub fn update_word(
        &mut self,
        id: &str,
        patch: WordPatch,
        now: DateTime<Utc>,
    ) -> Result<Word, StoreError> {
        let word = self.get_mut(id)?;

        if let Some(text) = patch.text {
            let text = text.trim();
            if text.is_empty() {
                return Err(StoreError::InvalidInput("word text is empty".to_string()));
            }
            word.text = text.to_string();
        }
        if let Some(translation) = patch.translation {
            word.translation = normalize_optional(translation);
        }
        if let Some(example) = patch.example {
            word.example = normalize_optional(example);
        }
        if let Some(topic) = patch.topic {
            word.topic = normalize_optional(topic);
        }
        if let Some(language) = patch.language {
            let language = language.trim();
            if !language.is_empty() {
                word.language = language.to_string();
            }
        }
        word.updated_at = now;
        Ok(word.clone())
    }

    pub fn delete_word(&mut self, id: &str) -> Result<Word, StoreError> {
        let position = self
            .words
            .iter()
            .position(|word| word.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(self.words.remove(position))
    }

    /// Applies the scheduler to `id` and bumps its counters.
    pub fn record_answer(
        &mut self,
        id: &str,
        was_correct: bool,
        now: DateTime<Utc>,
    ) -> Result<Word, StoreError> {
        let word = self.get_mut(id)?;
        let schedule = scheduler::compute_next_schedule(word, was_correct, now);

        // Counters stop at u32::MAX; correct + wrong never exceeds review.
        if let Some(review_count) = word.review_count.checked_add(1) {
            word.review_count = review_count;
            if was_correct {
                word.correct_count += 1;
            } else {
                word.wrong_count += 1;
            }
        }
        word.interval_days = Some(schedule.interval_days);
        word.next_review_at = Some(schedule.next_review_at);
        word.last_reviewed_at = Some(schedule.last_reviewed_at);
        word.updated_at = now;

        debug_assert!(word.stats_consistent());
        Ok(word.clone())
    }

    pub fn due_pool(&self, now: DateTime<Utc>) -> Vec<String> {
        self.words
            .iter()
            .filter(|word| scheduler::is_due(word, now))
            .map(|word| word.id.clone())
            .collect()
    }

    /// Due words that can also be quizzed.
    pub fn due_candidates(&self, now: DateTime<Utc>) -> Vec<String> {
        self.candidates()
            .filter(|word| scheduler::is_due(word, now))
            .map(|word| word.id.clone())
            .collect()
    }

    pub fn due_count(&self, now: DateTime<Utc>) -> usize {
        self.words
            .iter()
            .filter(|word| scheduler::is_due(word, now))
            .count()
    }

    /// Words that can appear in a question, either as target or distractor.
    pub fn candidates(&self) -> impl Iterator<Item = &Word> {
        self.words.iter().filter(|word| word.has_translation())
    }

    pub fn stats(&self, now: DateTime<Utc>) -> WordStats {
        let mut stats = WordStats {
            total: self.words.len(),
            ..Default::default()
        };
        for word in &self.words {
            if scheduler::is_due(word, now) {
                stats.due += 1;
            }
            if word.review_count > 0 {
                stats.reviewed += 1;
            }
            stats.correct += u64::from(word.correct_count);
            stats.wrong += u64::from(word.wrong_count);
        }
        let answered = stats.correct + stats.wrong;
        if answered > 0 {
            stats.accuracy = ((stats.correct as f64 / answered as f64) * 100.0).round() as u32;
        }
        stats
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
