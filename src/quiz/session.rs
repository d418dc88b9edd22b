use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::quiz::question::{build_question, capture_cards, Card, Question, MIN_CANDIDATES};
use crate::quiz::random::{self, RandomSource};
use crate::quiz::{AnswerOutcome, QuizError, SessionStateError, ValidationError};
use crate::words::WordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub total: u32,
    pub correct: u32,
    pub wrong: u32,
    pub accuracy: u32,
}

impl SessionSummary {
    pub fn new(correct: u32, wrong: u32) -> Self {
        let total = correct + wrong;
        let accuracy = if total == 0 {
            0
        } else {
            (f64::from(correct) / f64::from(total) * 100.0).round() as u32
        };
        Self {
            total,
            correct,
            wrong,
            accuracy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Nothing is due; the session did not start.
    EmptyPool,
    Started(Question),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextOutcome {
    Question(Question),
    /// The session is already over; carries the existing summary.
    Finished(SessionSummary),
}

#[derive(Debug, Clone)]
struct ActiveSession {
    queue: Vec<String>,
    index: usize,
    /// Translations frozen at start so edits made mid-session do not move
    /// the ground under pending questions.
    cards: Vec<Card>,
    question: Question,
    answered: bool,
    correct: u32,
    wrong: u32,
}

impl ActiveSession {
    fn is_last(&self) -> bool {
        self.index + 1 >= self.queue.len()
    }

    fn question_for(
        &self,
        index: usize,
        rng: &mut dyn RandomSource,
    ) -> Result<Question, QuizError> {
        let target = target_card(&self.cards, &self.queue[index])?;
        build_question(target, &self.cards, rng)
    }
}

#[derive(Debug, Clone, Default)]
enum Phase {
    #[default]
    Idle,
    InProgress(Box<ActiveSession>),
    Finished(SessionSummary),
}

/// Review session over a due pool: `Idle -> InProgress -> Finished`.
///
/// `answer` and `next` alternate strictly. A second `answer` on the same
/// question or a `next` before answering fails with
/// [`SessionStateError`] instead of being ignored.
#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    phase: Phase,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Idle => SessionState::Idle,
            Phase::InProgress(_) => SessionState::InProgress,
            Phase::Finished(_) => SessionState::Finished,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        match &self.phase {
            Phase::InProgress(active) => Some(&active.question),
            _ => None,
        }
    }

    pub fn is_answered(&self) -> bool {
        match &self.phase {
            Phase::InProgress(active) => active.answered,
            Phase::Finished(_) => true,
            Phase::Idle => false,
        }
    }

    pub fn queue(&self) -> Option<&[String]> {
        match &self.phase {
            Phase::InProgress(active) => Some(&active.queue),
            _ => None,
        }
    }

    /// `(index, queue length)` while a session is running.
    pub fn progress(&self) -> Option<(usize, usize)> {
        match &self.phase {
            Phase::InProgress(active) => Some((active.index, active.queue.len())),
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        match self.phase {
            Phase::Finished(summary) => Some(summary),
            _ => None,
        }
    }

    /// Reads the summary and discards the finished session.
    pub fn take_summary(&mut self) -> Option<SessionSummary> {
        let summary = self.summary()?;
        self.phase = Phase::Idle;
        Some(summary)
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Starts a session over `due_pool`. An empty pool is not an error: the
    /// session stays where it was and [`StartOutcome::EmptyPool`] is returned.
    pub fn start(
        &mut self,
        store: &WordStore,
        due_pool: &[String],
        rng: &mut dyn RandomSource,
    ) -> Result<StartOutcome, QuizError> {
        if matches!(self.phase, Phase::InProgress(_)) {
            return Err(SessionStateError::AlreadyInProgress.into());
        }
        if due_pool.is_empty() {
            debug!("due pool empty, session not started");
            return Ok(StartOutcome::EmptyPool);
        }

        let cards = capture_cards(store);
        if cards.len() < MIN_CANDIDATES {
            return Err(ValidationError::InsufficientData.into());
        }

        let mut queue: Vec<String> = Vec::with_capacity(due_pool.len());
        for id in due_pool {
            if queue.contains(id) {
                continue;
            }
            target_card(&cards, id).map_err(|_| match store.get(id) {
                Some(_) => ValidationError::MissingTranslation(id.clone()),
                None => ValidationError::UnknownWord(id.clone()),
            })?;
            queue.push(id.clone());
        }
        random::shuffle(&mut queue, rng);

        let target = target_card(&cards, &queue[0])?;
        let question = build_question(target, &cards, rng)?;

        info!(queue_len = queue.len(), "quiz session started");
        self.phase = Phase::InProgress(Box::new(ActiveSession {
            queue,
            index: 0,
            cards,
            question: question.clone(),
            answered: false,
            correct: 0,
            wrong: 0,
        }));
        Ok(StartOutcome::Started(question))
    }

    /// Whether `id` still has to be answered in the running session. Words
    /// already graded are not pending.
    pub fn is_pending(&self, id: &str) -> bool {
        match &self.phase {
            Phase::InProgress(active) => {
                let from = if active.answered { active.index + 1 } else { active.index };
                active.queue.iter().skip(from).any(|queued| queued == id)
            }
            Phase::Idle | Phase::Finished(_) => false,
        }
    }

    /// Grades `selected` against the pending question, runs the scheduler for
    /// the target word and advances the counters. Answering the last queued
    /// word finishes the session.
    pub fn answer(
        &mut self,
        store: &mut WordStore,
        selected: &str,
        now: DateTime<Utc>,
    ) -> Result<AnswerOutcome, QuizError> {
        let active = match &mut self.phase {
            Phase::InProgress(active) => active,
            Phase::Idle | Phase::Finished(_) => {
                return Err(SessionStateError::NoPendingQuestion.into())
            }
        };
        if active.answered {
            return Err(SessionStateError::AlreadyAnswered.into());
        }

        let was_correct = active.question.is_correct(selected);
        let word = store.record_answer(&active.question.word_id, was_correct, now)?;

        if was_correct {
            active.correct += 1;
        } else {
            active.wrong += 1;
        }
        active.answered = true;

        let mut outcome = AnswerOutcome {
            word_id: active.question.word_id.clone(),
            selected: selected.to_string(),
            correct_answer: active.question.correct_answer().to_string(),
            was_correct,
            word,
            summary: None,
        };

        if active.is_last() {
            let summary = SessionSummary::new(active.correct, active.wrong);
            info!(
                total = summary.total,
                correct = summary.correct,
                accuracy = summary.accuracy,
                "quiz session finished"
            );
            self.phase = Phase::Finished(summary);
            outcome.summary = Some(summary);
        }
        Ok(outcome)
    }

    /// Moves to the next queued word once the current one is answered. After
    /// the session finished this is a no-op that returns the summary.
    pub fn next(&mut self, rng: &mut dyn RandomSource) -> Result<NextOutcome, QuizError> {
        let active = match &mut self.phase {
            Phase::InProgress(active) => active,
            Phase::Finished(summary) => return Ok(NextOutcome::Finished(*summary)),
            Phase::Idle => return Err(SessionStateError::NotStarted.into()),
        };
        if !active.answered {
            return Err(SessionStateError::NotAnswered.into());
        }

        let question = active.question_for(active.index + 1, rng)?;
        active.index += 1;
        active.question = question.clone();
        active.answered = false;
        Ok(NextOutcome::Question(question))
    }
}

fn target_card<'a>(cards: &'a [Card], id: &str) -> Result<&'a Card, QuizError> {
    cards
        .iter()
        .find(|card| card.word_id == id)
        .ok_or_else(|| ValidationError::UnknownWord(id.to_string()).into())
}
