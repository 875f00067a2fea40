//! CSV dump of every card, for importing elsewhere

use crate::card::Card;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const EXPORT_FILE_NAME: &str = "flashcards.csv";

#[derive(Debug, Serialize)]
struct Record<'a> {
    id: i64,
    front: &'a str,
    back: &'a str,
    ease_factor: f64,
    interval: i64,
    repetitions: i64,
    due_date: String,
}

impl<'a> From<&'a Card> for Record<'a> {
    fn from(card: &'a Card) -> Self {
        let state = &card.memory_state;
        Self {
            id: card.id,
            front: &card.front,
            back: &card.back,
            ease_factor: state.ease_factor,
            interval: state.interval,
            repetitions: state.repetitions,
            due_date: state.due_date.to_rfc3339(),
        }
    }
}

pub fn write_csv<W: Write>(cards: &[Card], writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if cards.is_empty() {
        wtr.write_record([
            "id",
            "front",
            "back",
            "ease_factor",
            "interval",
            "repetitions",
            "due_date",
        ])?;
    }
    for card in cards {
        wtr.serialize(Record::from(card))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `cards` to `dir/flashcards.csv`, replacing any earlier export.
pub fn export_to_dir(cards: &[Card], dir: &Path) -> csv::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(EXPORT_FILE_NAME);
    let file = std::fs::File::create(&path)?;
    write_csv(cards, file)?;
    log::info!("exported {} cards to {:?}", cards.len(), path);
    Ok(path)
}
