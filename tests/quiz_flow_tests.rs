use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use vocab_trainer::quiz::{ScriptedRandom, StdRandom};
use vocab_trainer::scheduler::{Clock, FixedClock};
use vocab_trainer::{
    ErrorKind, MemoryStore, NewWord, NextOutcome, Question, SessionState, SessionSummary,
    StartOutcome, Trainer, WordPatch, WordStore,
};

const WORDS: &[(&str, &str)] = &[
    ("Apfel", "apple"),
    ("Brot", "bread"),
    ("Käse", "cheese"),
    ("Milch", "milk"),
    ("Wasser", "water"),
];

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 7, 9, 30, 0).unwrap()
}

async fn trainer_with_words(memory: Arc<MemoryStore>, clock: Arc<FixedClock>) -> Trainer {
    let mut trainer =
        Trainer::open_with(memory, Box::new(StdRandom::seeded(7)), clock).await;
    for (text, translation) in WORDS {
        trainer
            .add_word(NewWord::new(*text, *translation).with_language("de"))
            .await
            .unwrap();
    }
    trainer
}

fn wrong_option(question: &Question) -> String {
    question
        .options
        .iter()
        .find(|option| option.as_str() != question.correct_answer())
        .cloned()
        .unwrap()
}

fn assert_well_formed(question: &Question, candidates: usize) {
    assert_eq!(question.options.len(), candidates.min(4));
    let distinct: HashSet<_> = question.options.iter().collect();
    assert_eq!(distinct.len(), question.options.len());
    let hits = question
        .options
        .iter()
        .filter(|option| option.as_str() == question.correct_answer())
        .count();
    assert_eq!(hits, 1);
}

#[tokio::test]
async fn test_full_session_three_right_two_wrong() {
    let memory = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(start_time()));
    let mut trainer = trainer_with_words(memory.clone(), clock.clone()).await;

    let mut question = match trainer.start_session().unwrap() {
        StartOutcome::Started(question) => question,
        StartOutcome::EmptyPool => panic!("all new words should be due"),
    };
    assert_eq!(trainer.session_state(), SessionState::InProgress);

    let mut seen = HashSet::new();
    let mut summary = None;
    for round in 0..WORDS.len() {
        assert_well_formed(&question, WORDS.len());
        assert!(seen.insert(question.word_id.clone()), "word asked twice");

        let selected = if round < 3 {
            question.correct_answer().to_string()
        } else {
            wrong_option(&question)
        };
        let outcome = trainer.answer(&selected).await.unwrap();
        assert_eq!(outcome.was_correct, round < 3);
        assert_eq!(outcome.word.interval_days, Some(1));

        if let Some(done) = outcome.summary {
            assert_eq!(round, WORDS.len() - 1);
            summary = Some(done);
            break;
        }
        question = match trainer.next().unwrap() {
            NextOutcome::Question(question) => question,
            NextOutcome::Finished(_) => panic!("finished early"),
        };
    }

    let expected = SessionSummary {
        total: 5,
        correct: 3,
        wrong: 2,
        accuracy: 60,
    };
    assert_eq!(summary, Some(expected));
    assert_eq!(trainer.session_state(), SessionState::Finished);
    assert!(matches!(trainer.next().unwrap(), NextOutcome::Finished(s) if s == expected));

    let saved = WordStore::from_snapshot(memory.current().unwrap());
    let stats = saved.stats(clock.now());
    assert_eq!(stats.correct, 3);
    assert_eq!(stats.wrong, 2);
    assert_eq!(stats.reviewed, 5);
    assert_eq!(stats.due, 0);

    clock.advance(Duration::days(1));
    assert_eq!(trainer.due_words().len(), 5);
}

#[tokio::test]
async fn test_interval_ladder_through_sessions() {
    let memory = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(start_time()));
    let mut trainer = trainer_with_words(memory, clock.clone()).await;
    let target = trainer.store().words()[0].id.clone();

    let mut intervals = Vec::new();
    for _ in 0..6 {
        let question = match trainer.start_session_with(&[target.clone()]).unwrap() {
            StartOutcome::Started(question) => question,
            StartOutcome::EmptyPool => unreachable!(),
        };
        let answer = question.correct_answer().to_string();
        let outcome = trainer.answer(&answer).await.unwrap();
        assert!(outcome.summary.is_some());
        intervals.push(outcome.word.interval_days.unwrap());
        trainer.reset_session();
        clock.advance(Duration::days(i64::from(*intervals.last().unwrap())));
    }

    assert_eq!(intervals, vec![1, 3, 7, 14, 28, 56]);
}

#[tokio::test]
async fn test_translation_edit_mid_session_keeps_question_snapshot() {
    let memory = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(start_time()));
    let mut trainer =
        Trainer::open_with(memory, Box::new(ScriptedRandom::zeros()), clock).await;
    for (text, translation) in &WORDS[..3] {
        trainer.add_word(NewWord::new(*text, *translation)).await.unwrap();
    }

    let question = match trainer.start_session().unwrap() {
        StartOutcome::Started(question) => question,
        StartOutcome::EmptyPool => unreachable!(),
    };
    let original = question.correct_answer().to_string();
    trainer
        .update_word(&question.word_id, WordPatch::translation("changed"))
        .await
        .unwrap();

    let outcome = trainer.answer(&original).await.unwrap();

    assert!(outcome.was_correct);
    assert_eq!(outcome.word.translation.as_deref(), Some("changed"));
}

#[tokio::test]
async fn test_protocol_errors_surface_as_session_state() {
    let memory = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(start_time()));
    let mut trainer = trainer_with_words(memory, clock).await;

    let err = trainer.answer("apple").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SessionState);
    assert_eq!(trainer.next().unwrap_err().kind(), ErrorKind::SessionState);

    trainer.start_session().unwrap();
    assert_eq!(trainer.next().unwrap_err().kind(), ErrorKind::SessionState);
    assert_eq!(
        trainer.start_session().unwrap_err().kind(),
        ErrorKind::SessionState
    );

    let selected = trainer.current_question().unwrap().correct_answer().to_string();
    trainer.answer(&selected).await.unwrap();
    assert_eq!(
        trainer.answer(&selected).await.unwrap_err().kind(),
        ErrorKind::SessionState
    );
}

#[tokio::test]
async fn test_deleting_words_during_a_session_keeps_it_finishable() {
    let memory = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(start_time()));
    let mut trainer = trainer_with_words(memory, clock).await;
    trainer.start_session().unwrap();

    let first = trainer.current_question().unwrap().clone();
    let err = trainer.delete_word(&first.word_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SessionState);
    assert!(trainer.store().get(&first.word_id).is_some());

    trainer.answer(first.correct_answer()).await.unwrap();
    trainer.delete_word(&first.word_id).await.unwrap();
    assert_eq!(trainer.store().len(), WORDS.len() - 1);

    let mut summary = None;
    while summary.is_none() {
        trainer.next().unwrap();
        let answer = trainer.current_question().unwrap().correct_answer().to_string();
        summary = trainer.answer(&answer).await.unwrap().summary;
    }

    assert_eq!(summary.unwrap().total, WORDS.len() as u32);
    assert_eq!(trainer.session_state(), SessionState::Finished);
    let remaining = trainer.store().words()[0].id.clone();
    trainer.delete_word(&remaining).await.unwrap();
}

#[tokio::test]
async fn test_failed_load_starts_empty_and_reports_insufficient_data() {
    let memory = Arc::new(MemoryStore::new());
    memory.set_fail_loads(true);
    let clock = Arc::new(FixedClock::new(start_time()));
    let mut trainer =
        Trainer::open_with(memory.clone(), Box::new(ScriptedRandom::zeros()), clock).await;

    assert!(trainer.store().is_empty());
    assert!(matches!(trainer.start_session().unwrap(), StartOutcome::EmptyPool));
    assert_eq!(trainer.session_state(), SessionState::Idle);
    assert_eq!(trainer.adhoc_question().unwrap_err().kind(), ErrorKind::Validation);

    trainer.add_word(NewWord::new("allein", "alone")).await.unwrap();
    assert_eq!(trainer.start_session().unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(memory.save_count(), 1);
}

#[tokio::test]
async fn test_adhoc_prefers_due_words() {
    let memory = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(start_time()));
    let mut trainer = trainer_with_words(memory, clock).await;

    let mut reviewed = HashSet::new();
    for _ in 0..4 {
        let question = trainer.adhoc_question().unwrap();
        assert!(reviewed.insert(question.word_id.clone()));
        let answer = question.correct_answer().to_string();
        trainer.answer_adhoc(&question, &answer).await.unwrap();
    }

    let remaining = trainer.due_words();
    assert_eq!(remaining.len(), 1);
    let due_id = remaining[0].id.clone();
    for _ in 0..10 {
        let question = trainer.adhoc_question().unwrap();
        assert_eq!(question.word_id, due_id);
        assert_well_formed(&question, WORDS.len());
    }
}
