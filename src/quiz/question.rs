use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::quiz::random::{self, RandomSource};
use crate::quiz::{AnswerOutcome, QuizError, ValidationError};
use crate::words::{Word, WordStore};

pub const MAX_OPTIONS: usize = 4;
/// Fewer words with a translation than this and no question can be built.
pub const MIN_CANDIDATES: usize = 2;

/// Frozen view of a word as it looked when a question pool was captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub word_id: String,
    pub text: String,
    pub translation: String,
    pub language: String,
}

impl Card {
    pub fn from_word(word: &Word) -> Option<Self> {
        let translation = word.translation_text()?;
        Some(Self {
            word_id: word.id.clone(),
            text: word.text.clone(),
            translation: translation.to_string(),
            language: word.language.clone(),
        })
    }
}

pub fn capture_cards(store: &WordStore) -> Vec<Card> {
    store.candidates().filter_map(Card::from_word).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub word_id: String,
    pub prompt: String,
    pub language: String,
    pub options: Vec<String>,
    #[serde(skip)]
    correct_index: usize,
}

impl Question {
    pub fn correct_answer(&self) -> &str {
        &self.options[self.correct_index]
    }

    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    /// Exact match against the correct translation.
    pub fn is_correct(&self, selected: &str) -> bool {
        selected == self.correct_answer()
    }
}

/// Builds one question for `target` using `cards` as the distractor pool.
///
/// Distractors share the target's language, are drawn without replacement and
/// never repeat the correct translation, so it appears exactly once.
pub fn build_question(
    target: &Card,
    cards: &[Card],
    rng: &mut dyn RandomSource,
) -> Result<Question, QuizError> {
    if cards.len() < MIN_CANDIDATES {
        return Err(ValidationError::InsufficientData.into());
    }

    let mut pool: Vec<&str> = Vec::new();
    for card in cards {
        if card.word_id == target.word_id
            || card.language != target.language
            || card.translation == target.translation
            || pool.contains(&card.translation.as_str())
        {
            continue;
        }
        pool.push(card.translation.as_str());
    }

    let distractor_count = MAX_OPTIONS.min(pool.len() + 1) - 1;
    let mut options: Vec<String> = random::sample(&pool, distractor_count, rng)
        .into_iter()
        .map(str::to_string)
        .collect();
    options.push(target.translation.clone());
    random::shuffle(&mut options, rng);

    let correct_index = options
        .iter()
        .position(|option| *option == target.translation)
        .ok_or(ValidationError::InsufficientData)?;

    Ok(Question {
        word_id: target.word_id.clone(),
        prompt: target.text.clone(),
        language: target.language.clone(),
        options,
        correct_index,
    })
}

/// One-off question outside any session. Recomputes the due pool on every
/// call, prefers due words and falls back to every candidate.
pub fn generate_adhoc_question(
    store: &WordStore,
    now: DateTime<Utc>,
    rng: &mut dyn RandomSource,
) -> Result<Question, QuizError> {
    let cards = capture_cards(store);
    if cards.len() < MIN_CANDIDATES {
        return Err(ValidationError::InsufficientData.into());
    }

    let due: Vec<&Card> = cards
        .iter()
        .filter(|card| {
            store
                .get(&card.word_id)
                .is_some_and(|word| word.is_due(now))
        })
        .collect();
    let all: Vec<&Card> = cards.iter().collect();
    let pool = if due.is_empty() { &all } else { &due };

    let target = random::pick(pool, rng).ok_or(ValidationError::InsufficientData)?;
    build_question(target, &cards, rng)
}

/// Records an answer to an ad-hoc question. There is no session to guard
/// against repeats; every call is a new review.
pub fn answer_adhoc(
    store: &mut WordStore,
    question: &Question,
    selected: &str,
    now: DateTime<Utc>,
) -> Result<AnswerOutcome, QuizError> {
    let was_correct = question.is_correct(selected);
    let word = store.record_answer(&question.word_id, was_correct, now)?;
    Ok(AnswerOutcome {
        word_id: question.word_id.clone(),
        selected: selected.to_string(),
        correct_answer: question.correct_answer().to_string(),
        was_correct,
        word,
        summary: None,
    })
}
