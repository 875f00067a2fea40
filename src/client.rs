//! Blocking client for the review server

use crate::card::Card;
use reqwest::blocking::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

pub const DEFAULT_URL: &str = "http://127.0.0.1:8000";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status}: {message}")]
    Api { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Clone, Debug)]
pub struct Client {
    base_url: String,
    http: HttpClient,
}

#[derive(Deserialize)]
struct Created {
    id: i64,
}

#[derive(Deserialize)]
struct Reviewed {
    card: Card,
}

#[derive(Deserialize)]
struct Exported {
    filename: String,
}

impl Client {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http: HttpClient::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        parse(self.http.get(self.url(path)).send()?)
    }

    /// cards due now, at most ten
    pub fn due_cards(&self) -> Result<Vec<Card>> {
        self.get("/review")
    }

    pub fn submit_review(&self, card_id: i64, rating: i64) -> Result<Card> {
        let response = self
            .http
            .post(self.url("/review"))
            .json(&json!({ "card_id": card_id, "rating": rating }))
            .send()?;
        Ok(parse::<Reviewed>(response)?.card)
    }

    pub fn upcoming(&self) -> Result<Vec<Card>> {
        self.get("/upcoming")
    }

    pub fn all_cards(&self) -> Result<Vec<Card>> {
        self.get("/cards")
    }

    pub fn add_card(&self, front: &str, back: &str) -> Result<i64> {
        let response = self
            .http
            .post(self.url("/cards"))
            .json(&json!({ "front": front, "back": back }))
            .send()?;
        Ok(parse::<Created>(response)?.id)
    }

    /// Ask the server to write its CSV export; returns the file it wrote.
    pub fn export(&self) -> Result<String> {
        Ok(self.get::<Exported>("/export")?.filename)
    }
}

fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json()?);
    }
    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_owned))
        .unwrap_or(body);
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
