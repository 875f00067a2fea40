//! Review orchestration: picks due cards, applies the scheduler and writes the
//! result back through a [`CardStore`].

use crate::card::Card;
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, ReviewError};
use crate::scheduler::{validate_rating, Scheduler};
use crate::store::CardStore;
use log::{debug, info, warn};
use rand::prelude::SliceRandom;
use rand::rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Most cards handed out by one `list_due` call.
pub const MAX_DUE_BATCH: usize = 10;

/// How `list_due` picks among the due cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DueOrder {
    /// longest overdue first, ties by id
    #[default]
    Oldest,
    /// random sample of the due cards
    Shuffled,
}

pub struct ReviewService<S, C = SystemClock> {
    store: Arc<S>,
    clock: C,
    scheduler: Scheduler,
    due_order: DueOrder,
    locks: CardLocks,
}

impl<S: CardStore> ReviewService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: CardStore, C: Clock> ReviewService<S, C> {
    pub fn with_clock(store: Arc<S>, clock: C) -> Self {
        Self {
            store,
            clock,
            scheduler: Scheduler::default(),
            due_order: DueOrder::default(),
            locks: CardLocks::default(),
        }
    }

    pub fn scheduler(mut self, scheduler: Scheduler) -> Self {
        if scheduler.failure_ease_penalty() > 0.0 {
            warn!(
                "failed reviews will lower the ease factor by {}",
                scheduler.failure_ease_penalty()
            );
        }
        self.scheduler = scheduler;
        self
    }

    pub fn due_order(mut self, due_order: DueOrder) -> Self {
        self.due_order = due_order;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Up to `limit` (at most [`MAX_DUE_BATCH`]) cards that are due now.
    pub async fn list_due(&self, limit: usize) -> Result<Vec<Card>> {
        let now = self.clock.now();
        let limit = limit.min(MAX_DUE_BATCH);
        let cards = match self.due_order {
            DueOrder::Oldest => self.store.list_due(now, limit).await?,
            DueOrder::Shuffled => {
                let mut cards = self.store.list_due(now, usize::MAX).await?;
                cards.shuffle(&mut rng());
                cards.truncate(limit);
                cards
            }
        };
        debug!("{} cards due at {now}", cards.len());
        Ok(cards)
    }

    /// Apply a recall rating to a card and persist its next memory state.
    ///
    /// Reviews of the same card are serialized; the stored state is either
    /// fully replaced or left as it was.
    pub async fn submit_review(&self, card_id: i64, rating: i64) -> Result<Card> {
        validate_rating(rating)?;

        let _guard = self.locks.lock(card_id).await;
        let card = self
            .store
            .get(card_id)
            .await?
            .ok_or(ReviewError::CardNotFound(card_id))?;

        let next = self
            .scheduler
            .next_state(&card.memory_state, rating, self.clock.now())?;

        if !self.store.update(card_id, &next).await? {
            return Err(ReviewError::CardNotFound(card_id));
        }

        info!(
            "card {card_id} rated {rating}: reps {} interval {}d ease {:.2}, due {}",
            next.repetitions, next.interval, next.ease_factor, next.due_date
        );
        Ok(Card {
            memory_state: next,
            ..card
        })
    }

    /// Cards not yet due, soonest first.
    pub async fn list_upcoming(&self) -> Result<Vec<Card>> {
        Ok(self.store.list_upcoming(self.clock.now()).await?)
    }

    pub async fn add_card(&self, front: &str, back: &str) -> Result<i64> {
        if front.trim().is_empty() {
            return Err(ReviewError::InvalidInput("front is empty".to_owned()));
        }
        if back.trim().is_empty() {
            return Err(ReviewError::InvalidInput("back is empty".to_owned()));
        }
        let id = self.store.create(front, back, self.clock.now()).await?;
        info!("added card {id}");
        Ok(id)
    }

    pub async fn list_all(&self) -> Result<Vec<Card>> {
        Ok(self.store.list().await?)
    }
}

/// One async mutex per card id, created on demand and dropped once nobody
/// holds or waits on it.
#[derive(Default)]
struct CardLocks {
    inner: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

impl CardLocks {
    async fn lock(&self, id: i64) -> CardGuard<'_> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(map.entry(id).or_default())
        };
        CardGuard {
            locks: self,
            id,
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

struct CardGuard<'a> {
    locks: &'a CardLocks,
    id: i64,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for CardGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut map = self.locks.inner.lock().unwrap_or_else(|e| e.into_inner());
        if map.get(&self.id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            map.remove(&self.id);
        }
    }
}
