//! Card store backed by SQLite

use super::{CardStore, StoreError};
use crate::card::{Card, MemoryState};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const SCHEMA_VERSION: i32 = 1;

const SELECT_CARD: &str =
    "SELECT id, front, back, ease_factor, interval, repetitions, due_date FROM cards";

#[derive(Clone, Debug)]
pub struct SqliteStore {
    pub conn: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`.
    pub async fn open(path: &Path, acquire_timeout: Duration) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(acquire_timeout);
        let conn = SqlitePoolOptions::new()
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;
        info!("opened card database {:?}", path);
        let store = Self { conn };
        store.check_schema().await?;
        Ok(store)
    }

    /// Private database that lives as long as the store.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // every new connection would see an empty database
        let conn = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { conn };
        store.check_schema().await?;
        Ok(store)
    }

    async fn check_schema(&self) -> Result<(), StoreError> {
        let user_version: i32 = sqlx::query("pragma user_version;")
            .fetch_one(&self.conn)
            .await?
            .try_get(0)?;

        if user_version < SCHEMA_VERSION {
            debug!("creating card schema (user_version {user_version})");
            let sql = format!(
                "
BEGIN EXCLUSIVE;
CREATE TABLE IF NOT EXISTS cards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    front TEXT NOT NULL,
    back TEXT NOT NULL,
    ease_factor REAL NOT NULL DEFAULT 2.5,
    interval INTEGER NOT NULL DEFAULT 0,
    repetitions INTEGER NOT NULL DEFAULT 0,
    -- fixed-width RFC 3339 UTC, so text order is time order
    due_date TEXT NOT NULL
) STRICT;
CREATE INDEX IF NOT EXISTS cards_due ON cards(due_date, id);
PRAGMA user_version = {SCHEMA_VERSION};
COMMIT;
                 "
            );
            sqlx::raw_sql(&sql).execute(&self.conn).await?;
        }
        Ok(())
    }

    async fn fetch_cards<'q>(
        &self,
        query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> Result<Vec<Card>, StoreError> {
        query
            .fetch_all(&self.conn)
            .await?
            .iter()
            .map(card_from_row)
            .collect()
    }
}

pub(crate) fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn card_from_row(row: &SqliteRow) -> Result<Card, StoreError> {
    let id: i64 = row.try_get("id")?;
    let due_date: String = row.try_get("due_date")?;
    let due_date = DateTime::parse_from_rfc3339(&due_date)
        .map_err(|e| StoreError::Corrupt {
            id,
            reason: format!("due_date {due_date:?}: {e}"),
        })?
        .with_timezone(&Utc);

    Ok(Card {
        id,
        front: row.try_get("front")?,
        back: row.try_get("back")?,
        memory_state: MemoryState {
            ease_factor: row.try_get("ease_factor")?,
            interval: row.try_get("interval")?,
            repetitions: row.try_get("repetitions")?,
            due_date,
        },
    })
}

#[async_trait]
impl CardStore for SqliteStore {
    async fn get(&self, id: i64) -> Result<Option<Card>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_CARD} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.conn)
            .await?;
        row.as_ref().map(card_from_row).transpose()
    }

    async fn create(&self, front: &str, back: &str, now: DateTime<Utc>) -> Result<i64, StoreError> {
        let state = MemoryState::new(now);
        let id: i64 = sqlx::query("INSERT INTO cards (front, back, ease_factor, interval, repetitions, due_date) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id;")
            .bind(front)
            .bind(back)
            .bind(state.ease_factor)
            .bind(state.interval)
            .bind(state.repetitions)
            .bind(encode_timestamp(state.due_date))
            .fetch_one(&self.conn)
            .await?
            .try_get(0)?;
        Ok(id)
    }

    async fn update(&self, id: i64, state: &MemoryState) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE cards SET ease_factor = $1, interval = $2, repetitions = $3, due_date = $4 WHERE id = $5;")
            .bind(state.ease_factor)
            .bind(state.interval)
            .bind(state.repetitions)
            .bind(encode_timestamp(state.due_date))
            .bind(id)
            .execute(&self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<Card>, StoreError> {
        let sql = format!("{SELECT_CARD} ORDER BY id");
        self.fetch_cards(sqlx::query(&sql)).await
    }

    async fn list_due(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<Card>, StoreError> {
        let sql = format!("{SELECT_CARD} WHERE due_date <= $1 ORDER BY due_date, id LIMIT $2");
        let query = sqlx::query(&sql)
            .bind(encode_timestamp(now))
            .bind(i64::try_from(limit).unwrap_or(i64::MAX));
        self.fetch_cards(query).await
    }

    async fn list_upcoming(&self, now: DateTime<Utc>) -> Result<Vec<Card>, StoreError> {
        let sql = format!("{SELECT_CARD} WHERE due_date > $1 ORDER BY due_date, id");
        self.fetch_cards(sqlx::query(&sql).bind(encode_timestamp(now)))
            .await
    }
}
