//! SuperMemo-2 scheduling
//!
//! Recall ratings (1-5):
//! - 1: total failure
//! - 2: wrong, but the answer looked familiar
//! - 3: correct with serious difficulty
//! - 4: correct after hesitation
//! - 5: perfect recall
//!
//! Ratings below 3 reset the card. Unlike canonical SM-2 the ease factor is
//! left alone on failure unless [`Scheduler::failure_ease_penalty`] is set.

use crate::card::{MemoryState, MIN_EASE_FACTOR};
use chrono::{DateTime, Duration, Utc};
use log::debug;
use thiserror::Error;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;
/// lowest rating that counts as a successful recall
pub const PASSING_RATING: i64 = 3;

const FIRST_INTERVAL: i64 = 1;
const SECOND_INTERVAL: i64 = 6;
/// keeps `now + interval` representable
pub const MAX_INTERVAL: i64 = 36_500;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating {0} is outside 1..=5")]
pub struct InvalidRating(pub i64);

pub fn validate_rating(rating: i64) -> Result<i64, InvalidRating> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(InvalidRating(rating))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scheduler {
    failure_ease_penalty: f64,
}

impl Scheduler {
    /// Negative penalties are treated as zero.
    pub fn with_failure_ease_penalty(penalty: f64) -> Self {
        Self {
            failure_ease_penalty: penalty.max(0.0),
        }
    }

    /// Subtracted from the ease factor on a failed review. Zero keeps the
    /// ease factor unchanged on failure.
    pub fn failure_ease_penalty(&self) -> f64 {
        self.failure_ease_penalty
    }

    pub fn next_state(
        &self,
        current: &MemoryState,
        rating: i64,
        now: DateTime<Utc>,
    ) -> Result<MemoryState, InvalidRating> {
        let q = validate_rating(rating)?;

        let (ease_factor, interval, repetitions) = if q < PASSING_RATING {
            let ease_factor = (current.ease_factor - self.failure_ease_penalty).max(MIN_EASE_FACTOR);
            (ease_factor, FIRST_INTERVAL, 0)
        } else {
            let repetitions = current.repetitions + 1;
            let ease_factor = next_ease_factor(current.ease_factor, q);
            let interval = match repetitions {
                1 => FIRST_INTERVAL,
                2 => SECOND_INTERVAL,
                _ => ((current.interval as f64 * ease_factor).round() as i64)
                    .clamp(FIRST_INTERVAL, MAX_INTERVAL),
            };
            (ease_factor, interval, repetitions)
        };

        debug!(
            "[SM-2] q={q}: ease {:.2} -> {:.2}, interval {}d -> {}d, reps {} -> {}",
            current.ease_factor, ease_factor, current.interval, interval, current.repetitions, repetitions
        );

        Ok(MemoryState {
            ease_factor,
            interval,
            repetitions,
            due_date: now + Duration::days(interval),
        })
    }
}

/// EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02)), floored at 1.3
fn next_ease_factor(ease_factor: f64, q: i64) -> f64 {
    let miss = (MAX_RATING - q) as f64;
    (ease_factor + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EASE_FACTOR)
}

/// Next memory state with the default policy (ease untouched on failure).
pub fn compute_next_state(
    current: &MemoryState,
    rating: i64,
    now: DateTime<Utc>,
) -> Result<MemoryState, InvalidRating> {
    Scheduler::default().next_state(current, rating, now)
}
