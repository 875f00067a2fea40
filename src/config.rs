use crate::review::DueOrder;
use crate::scheduler::Scheduler;
use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Flashcard review server
#[derive(Parser, Debug, Clone)]
#[command(name = "flashcardd", disable_version_flag = true)]
pub struct ServerConfig {
    /// address to listen on
    #[arg(long, env = "FLASHCARDS_ADDR", default_value = "127.0.0.1:8000")]
    pub addr: SocketAddr,

    /// card database, defaults to the user data directory
    #[arg(long, env = "FLASHCARDS_DB")]
    pub db: Option<PathBuf>,

    /// where `GET /export` writes its CSV, defaults to the data directory
    #[arg(long, env = "FLASHCARDS_EXPORT_DIR")]
    pub export_dir: Option<PathBuf>,

    /// hand out a random sample of due cards instead of the oldest
    #[arg(long, default_value_t = false)]
    pub shuffle: bool,

    /// lower the ease factor by this much on a failed review (0 = unchanged)
    #[arg(long, default_value_t = 0.0)]
    pub failure_ease_penalty: f64,

    /// seconds to wait for a database connection before failing a request
    #[arg(long, env = "FLASHCARDS_DB_TIMEOUT", default_value_t = 5)]
    pub acquire_timeout_secs: u64,

    #[arg(long, default_value_t = false)]
    pub show_path: bool,

    #[arg(long, default_value_t = false)]
    pub version: bool,
}

impl ServerConfig {
    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.db {
            Some(path) => Ok(path.clone()),
            None => crate::db_path(),
        }
    }

    pub fn export_dir(&self) -> Result<PathBuf> {
        match &self.export_dir {
            Some(path) => Ok(path.clone()),
            None => crate::data_dir(),
        }
    }

    pub fn due_order(&self) -> DueOrder {
        if self.shuffle {
            DueOrder::Shuffled
        } else {
            DueOrder::Oldest
        }
    }

    pub fn scheduler(&self) -> Scheduler {
        Scheduler::with_failure_ease_penalty(self.failure_ease_penalty)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::try_parse_from(["flashcardd"]).unwrap();
        assert_eq!(config.addr, "127.0.0.1:8000".parse().unwrap());
        assert_eq!(config.due_order(), DueOrder::Oldest);
        assert_eq!(config.scheduler(), Scheduler::default());
        assert_eq!(config.acquire_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "flashcardd",
            "--addr",
            "0.0.0.0:9000",
            "--db",
            "/tmp/cards.db",
            "--shuffle",
            "--failure-ease-penalty",
            "0.2",
        ])
        .unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.db_path().unwrap(), PathBuf::from("/tmp/cards.db"));
        assert_eq!(config.due_order(), DueOrder::Shuffled);
        assert_eq!(config.scheduler().failure_ease_penalty(), 0.2);
    }
}
