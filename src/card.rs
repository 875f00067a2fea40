use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const INITIAL_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Scheduling payload of a card, rewritten on every review.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MemoryState {
    pub ease_factor: f64,
    /// days
    pub interval: i64,
    /// consecutive successful reviews since the last failure
    pub repetitions: i64,
    pub due_date: DateTime<Utc>,
}

impl MemoryState {
    /// State of a card that has never been reviewed: due at `created`.
    pub fn new(created: DateTime<Utc>) -> Self {
        Self {
            ease_factor: INITIAL_EASE_FACTOR,
            interval: 0,
            repetitions: 0,
            due_date: created,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_date <= now
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Card {
    pub id: i64,
    pub front: String,
    pub back: String,
    #[serde(flatten)]
    pub memory_state: MemoryState,
}
