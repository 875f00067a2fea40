use anyhow::Result;
use flashcard_reviewer::client::{Client, DEFAULT_URL};
use std::env::{self, args};

fn main() -> Result<()> {
    let front = args().nth(1).unwrap_or("--help".to_owned());
    let Some(back) = args().nth(2).filter(|_| front != "--help") else {
        println!("usage: add_card <front> <back>");
        println!("server url is taken from FLASHCARDS_URL, default {DEFAULT_URL}");
        return Ok(());
    };

    let url = env::var("FLASHCARDS_URL").unwrap_or(DEFAULT_URL.to_owned());
    let id = Client::new(&url).add_card(&front, &back)?;
    println!("{id}");
    Ok(())
}
