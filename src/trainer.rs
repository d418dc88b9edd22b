//! Facade wiring the word store, a persistence adapter and the quiz engine.
//! Every mutation is saved immediately; a failed save is logged and the
//! in-memory state stays authoritative.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::TrainerError;
use crate::persistence::PersistenceAdapter;
use crate::quiz::{
    self, AnswerOutcome, NextOutcome, Question, QuizError, QuizSession, RandomSource,
    SessionState, SessionStateError, StartOutcome, StdRandom,
};
use crate::scheduler::{Clock, SystemClock};
use crate::words::{NewWord, Word, WordPatch, WordStats, WordStore};

pub struct Trainer {
    store: WordStore,
    adapter: Arc<dyn PersistenceAdapter>,
    session: QuizSession,
    rng: Box<dyn RandomSource>,
    clock: Arc<dyn Clock>,
}

impl Trainer {
    pub async fn open(adapter: Arc<dyn PersistenceAdapter>) -> Self {
        Self::open_with(adapter, Box::new(StdRandom::new()), Arc::new(SystemClock)).await
    }

    pub async fn open_with(
        adapter: Arc<dyn PersistenceAdapter>,
        rng: Box<dyn RandomSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = WordStore::load(adapter.as_ref()).await;
        info!(words = store.len(), "trainer opened");
        Self {
            store,
            adapter,
            session: QuizSession::new(),
            rng,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn store(&self) -> &WordStore {
        &self.store
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.session.current_question()
    }

    pub fn stats(&self) -> WordStats {
        self.store.stats(self.now())
    }

    pub fn due_words(&self) -> Vec<&Word> {
        let now = self.now();
        self.store
            .words()
            .iter()
            .filter(|word| word.is_due(now))
            .collect()
    }

    pub async fn add_word(&mut self, input: NewWord) -> Result<Word, TrainerError> {
        let word = self.store.add_word(input, self.now())?;
        info!(word_id = %word.id, "word added");
        self.persist().await;
        Ok(word)
    }

    pub async fn update_word(&mut self, id: &str, patch: WordPatch) -> Result<Word, TrainerError> {
        let word = self.store.update_word(id, patch, self.now())?;
        self.persist().await;
        Ok(word)
    }

    /// Words still waiting in a running session cannot be deleted until the
    /// session finishes or is reset.
    pub async fn delete_word(&mut self, id: &str) -> Result<Word, TrainerError> {
        if self.session.is_pending(id) {
            return Err(QuizError::from(SessionStateError::WordInSession(id.to_string())).into());
        }
        let word = self.store.delete_word(id)?;
        info!(word_id = %word.id, "word deleted");
        self.persist().await;
        Ok(word)
    }

    /// Starts a session over every due word that has a translation.
    pub fn start_session(&mut self) -> Result<StartOutcome, TrainerError> {
        let pool = self.store.due_candidates(self.now());
        self.start_session_with(&pool)
    }

    pub fn start_session_with(&mut self, pool: &[String]) -> Result<StartOutcome, TrainerError> {
        Ok(self.session.start(&self.store, pool, self.rng.as_mut())?)
    }

    pub async fn answer(&mut self, selected: &str) -> Result<AnswerOutcome, TrainerError> {
        let now = self.now();
        let outcome = self.session.answer(&mut self.store, selected, now)?;
        self.persist().await;
        Ok(outcome)
    }

    pub fn next(&mut self) -> Result<NextOutcome, TrainerError> {
        Ok(self.session.next(self.rng.as_mut())?)
    }

    pub fn reset_session(&mut self) {
        self.session.reset();
    }

    pub fn adhoc_question(&mut self) -> Result<Question, TrainerError> {
        let now = self.now();
        Ok(quiz::generate_adhoc_question(&self.store, now, self.rng.as_mut())?)
    }

    pub async fn answer_adhoc(
        &mut self,
        question: &Question,
        selected: &str,
    ) -> Result<AnswerOutcome, TrainerError> {
        let now = self.now();
        let outcome = quiz::answer_adhoc(&mut self.store, question, selected, now)?;
        self.persist().await;
        Ok(outcome)
    }

    /// Saves now and reports the failure instead of logging it.
    pub async fn flush(&self) -> Result<(), TrainerError> {
        self.store.save(self.adapter.as_ref(), self.now()).await?;
        Ok(())
    }

    async fn persist(&self) {
        if let Err(err) = self.store.save(self.adapter.as_ref(), self.now()).await {
            warn!(error = %err, "failed to persist word snapshot");
        }
    }
}
