pub mod card;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod review;
pub mod scheduler;
pub mod server;
pub mod store;

pub use card::{Card, MemoryState};
pub use error::ReviewError;
pub use review::{DueOrder, ReviewService};
pub use scheduler::{compute_next_state, Scheduler};
pub use store::{CardStore, SqliteStore};

use anyhow::Context;
use anyhow::Result;
use std::fs::create_dir_all;
use std::path::PathBuf;

const APP_DIR: &str = "flashcards";

fn ensure_dir(path: PathBuf) -> Result<PathBuf> {
    if !path.exists() {
        create_dir_all(&path).with_context(|| format!("Failed to create directory {:?}", path))?;
    }
    Ok(path)
}

pub fn data_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("Couldn't find data directory")?;
    ensure_dir(base.join(APP_DIR))
}

pub fn db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("flashcards.db"))
}

pub fn log_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("Couldn't find cache directory")?;
    ensure_dir(base.join(APP_DIR))
}
