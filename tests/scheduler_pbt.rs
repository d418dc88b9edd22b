//! Property tests for the scheduler and session queue.
//!
//! - Intervals stay within [1, 60] for any answer history
//! - A wrong answer always resets the interval to one day
//! - Review counters always add up
//! - A session asks every pooled word exactly once

use std::collections::HashSet;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use vocab_trainer::quiz::{NextOutcome, QuizSession, StartOutcome, StdRandom};
use vocab_trainer::scheduler::{next_interval_days, MAX_INTERVAL_DAYS};
use vocab_trainer::{is_due, NewWord, WordStore};

fn arb_history() -> impl Strategy<Value = Vec<bool>> {
    proptest::collection::vec(any::<bool>(), 1..40)
}

proptest! {
    #[test]
    fn prop_interval_bounds(history in arb_history()) {
        let mut interval = None;
        for was_correct in history {
            let next = next_interval_days(interval, was_correct);
            prop_assert!((1..=MAX_INTERVAL_DAYS).contains(&next));
            if !was_correct {
                prop_assert_eq!(next, 1);
            }
            if let (Some(prev), true) = (interval, was_correct) {
                prop_assert!(next >= prev);
            }
            interval = Some(next);
        }
    }

    #[test]
    fn prop_store_counters_consistent(history in arb_history(), hours in 0i64..2000) {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut store = WordStore::new();
        let id = store.add_word(NewWord::new("Baum", "tree"), start).unwrap().id;

        let mut now = start;
        for (i, was_correct) in history.iter().enumerate() {
            let word = store.record_answer(&id, *was_correct, now).unwrap();
            prop_assert_eq!(word.review_count as usize, i + 1);
            prop_assert_eq!(word.review_count, word.correct_count + word.wrong_count);
            prop_assert!(!is_due(&word, now));
            let next = word.next_review_at.unwrap();
            prop_assert!(is_due(&word, next));
            prop_assert_eq!(
                next - now,
                Duration::days(i64::from(word.interval_days.unwrap()))
            );
            now += Duration::hours(hours);
        }
    }

    #[test]
    fn prop_session_queue_is_permutation(size in 2usize..12, seed in any::<u64>()) {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut store = WordStore::new();
        let ids: Vec<String> = (0..size)
            .map(|i| {
                store
                    .add_word(NewWord::new(format!("w{i}"), format!("t{i}")), now)
                    .unwrap()
                    .id
            })
            .collect();

        let mut rng = StdRandom::seeded(seed);
        let mut session = QuizSession::new();
        let mut question = match session.start(&store, &ids, &mut rng).unwrap() {
            StartOutcome::Started(question) => question,
            StartOutcome::EmptyPool => return Err(TestCaseError::fail("pool was not empty")),
        };

        let mut asked = Vec::new();
        loop {
            prop_assert_eq!(question.options.len(), size.min(4));
            asked.push(question.word_id.clone());
            let answer = question.correct_answer().to_string();
            let outcome = session.answer(&mut store, &answer, now).unwrap();
            if outcome.summary.is_some() {
                break;
            }
            question = match session.next(&mut rng).unwrap() {
                NextOutcome::Question(question) => question,
                NextOutcome::Finished(_) => break,
            };
        }

        prop_assert_eq!(asked.len(), size);
        let asked: HashSet<_> = asked.into_iter().collect();
        let expected: HashSet<_> = ids.into_iter().collect();
        prop_assert_eq!(asked, expected);
        prop_assert_eq!(session.summary().unwrap().accuracy, 100);
    }
}
