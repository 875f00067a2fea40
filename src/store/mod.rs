use crate::card::{Card, MemoryState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod sqlite;

pub use sqlite::SqliteStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("card {id} has a corrupt row: {reason}")]
    Corrupt { id: i64, reason: String },
}

/// Row store for cards keyed by id.
///
/// Implementations apply their own timeout policy; a timeout is reported as
/// an ordinary [`StoreError`].
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Card>, StoreError>;

    /// insert a card with a fresh memory state due at `now`
    async fn create(&self, front: &str, back: &str, now: DateTime<Utc>) -> Result<i64, StoreError>;

    /// `Ok(false)` when no card has this id
    async fn update(&self, id: i64, state: &MemoryState) -> Result<bool, StoreError>;

    async fn list(&self) -> Result<Vec<Card>, StoreError>;

    /// due cards ordered by due date then id
    async fn list_due(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<Card>, StoreError>;

    /// cards due after `now`, soonest first
    async fn list_upcoming(&self, now: DateTime<Utc>) -> Result<Vec<Card>, StoreError>;
}
