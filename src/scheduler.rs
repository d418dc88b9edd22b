//! Interval-doubling review scheduler.
//!
//! A correct answer walks the ladder `1 -> 3 -> 7` and then doubles up to
//! [`MAX_INTERVAL_DAYS`]; a wrong answer always drops the word back to one day.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::words::Word;

pub const MAX_INTERVAL_DAYS: u32 = 60;
pub const LAPSE_INTERVAL_DAYS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub interval_days: u32,
    pub next_review_at: DateTime<Utc>,
    pub last_reviewed_at: DateTime<Utc>,
}

pub fn next_interval_days(previous: Option<u32>, was_correct: bool) -> u32 {
    if !was_correct {
        return LAPSE_INTERVAL_DAYS;
    }
    match previous.unwrap_or(0) {
        0 => 1,
        1 => 3,
        3 => 7,
        prev => prev.saturating_mul(2).min(MAX_INTERVAL_DAYS),
    }
}

pub fn compute_next_schedule(word: &Word, was_correct: bool, now: DateTime<Utc>) -> Schedule {
    let interval_days = next_interval_days(word.interval_days, was_correct);
    Schedule {
        interval_days,
        next_review_at: now + Duration::days(i64::from(interval_days)),
        last_reviewed_at: now,
    }
}

/// Pool membership test. The boundary instant counts as due.
pub fn is_due(word: &Word, now: DateTime<Utc>) -> bool {
    match word.next_review_at {
        None => true,
        Some(next) => next <= now,
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock();
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn word_with(interval_days: Option<u32>, next_review_at: Option<DateTime<Utc>>) -> Word {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Word {
            id: "w-1".to_string(),
            text: "Haus".to_string(),
            translation: Some("house".to_string()),
            example: None,
            topic: None,
            language: "de".to_string(),
            review_count: 0,
            correct_count: 0,
            wrong_count: 0,
            interval_days,
            next_review_at,
            last_reviewed_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_correct_answers_follow_ladder() {
        let mut interval = None;
        let mut seen = Vec::new();
        for _ in 0..7 {
            let next = next_interval_days(interval, true);
            seen.push(next);
            interval = Some(next);
        }
        assert_eq!(seen, vec![1, 3, 7, 14, 28, 56, 60]);
        assert_eq!(next_interval_days(Some(60), true), 60);
    }

    #[test]
    fn test_cap_applies_to_off_ladder_values() {
        assert_eq!(next_interval_days(Some(40), true), 60);
        assert_eq!(next_interval_days(Some(2), true), 4);
        assert_eq!(next_interval_days(Some(0), true), 1);
    }

    #[test]
    fn test_wrong_answer_resets_to_one_day() {
        for prev in [None, Some(0), Some(1), Some(7), Some(60)] {
            assert_eq!(next_interval_days(prev, false), 1);
        }
    }

    #[test]
    fn test_schedule_from_three_days_correct() {
        let yesterday = now() - Duration::days(1);
        let word = word_with(Some(3), Some(yesterday));

        let schedule = compute_next_schedule(&word, true, now());

        assert_eq!(schedule.interval_days, 7);
        assert_eq!(schedule.next_review_at, now() + Duration::days(7));
        assert_eq!(schedule.last_reviewed_at, now());
    }

    #[test]
    fn test_due_predicate_boundaries() {
        assert!(is_due(&word_with(None, None), now()));
        assert!(is_due(&word_with(Some(1), Some(now())), now()));
        assert!(is_due(&word_with(Some(1), Some(now() - Duration::seconds(1))), now()));
        assert!(!is_due(&word_with(Some(1), Some(now() + Duration::seconds(1))), now()));
    }

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::new(now());
        clock.advance(Duration::days(2));
        assert_eq!(clock.now(), now() + Duration::days(2));
        clock.set(now());
        assert_eq!(clock.now(), now());
    }
}
