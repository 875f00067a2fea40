//! HTTP API over the review service.
//!
//! | route | |
//! |---|---|
//! | `GET /review` | up to 10 due cards |
//! | `POST /review` | `{card_id, rating}` |
//! | `GET /upcoming` | cards not yet due, soonest first |
//! | `GET /cards` | every card |
//! | `POST /cards` | `{front, back}` → `{id}` |
//! | `GET /export` | write a CSV export, returns its file name |

use crate::clock::Clock;
use crate::error::ReviewError;
use crate::export::export_to_dir;
use crate::review::{ReviewService, MAX_DUE_BATCH};
use crate::store::CardStore;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub struct AppState<S, C> {
    pub service: Arc<ReviewService<S, C>>,
    pub export_dir: PathBuf,
}

#[derive(Deserialize, Debug)]
pub struct ReviewRequest {
    pub card_id: i64,
    #[serde(alias = "difficulty")]
    pub rating: i64,
}

#[derive(Deserialize, Debug)]
pub struct AddCardRequest {
    #[serde(default)]
    pub front: String,
    #[serde(default)]
    pub back: String,
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReviewError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ReviewError::CardNotFound(_) => StatusCode::NOT_FOUND,
            ReviewError::InvalidRating(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ReviewError::Storage(e) => {
                error!("storage failure: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let label = match &self {
            ReviewError::CardNotFound(_) => "card not found",
            _ => "error",
        };
        (status, Json(json!({ "status": label, "error": self.to_string() }))).into_response()
    }
}

pub fn router<S, C>(service: Arc<ReviewService<S, C>>, export_dir: PathBuf) -> Router
where
    S: CardStore + 'static,
    C: Clock + 'static,
{
    let state = Arc::new(AppState {
        service,
        export_dir,
    });
    Router::new()
        .route("/review", get(due_cards::<S, C>).post(submit_review::<S, C>))
        .route("/upcoming", get(upcoming::<S, C>))
        .route("/cards", get(all_cards::<S, C>).post(add_card::<S, C>))
        .route("/export", get(export::<S, C>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve `app` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Missing, mistyped or unparsable request bodies are invalid input.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ReviewError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ReviewError::InvalidInput(rejection.body_text()))
}

/// Resolves once `signal` fires. A signal that could not be installed is
/// logged and also ends the wait.
pub async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutting down"),
        Err(e) => error!("cannot listen for shutdown signal, shutting down: {e}"),
    }
}

async fn due_cards<S: CardStore, C: Clock>(
    State(state): State<Arc<AppState<S, C>>>,
) -> Result<Response, ReviewError> {
    let cards = state.service.list_due(MAX_DUE_BATCH).await?;
    Ok(Json(cards).into_response())
}

async fn submit_review<S: CardStore, C: Clock>(
    State(state): State<Arc<AppState<S, C>>>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Response, ReviewError> {
    let request = json_body(payload)?;
    let card = state
        .service
        .submit_review(request.card_id, request.rating)
        .await?;
    Ok(Json(json!({ "status": "success", "card": card })).into_response())
}

async fn upcoming<S: CardStore, C: Clock>(
    State(state): State<Arc<AppState<S, C>>>,
) -> Result<Response, ReviewError> {
    Ok(Json(state.service.list_upcoming().await?).into_response())
}

async fn all_cards<S: CardStore, C: Clock>(
    State(state): State<Arc<AppState<S, C>>>,
) -> Result<Response, ReviewError> {
    Ok(Json(state.service.list_all().await?).into_response())
}

async fn add_card<S: CardStore, C: Clock>(
    State(state): State<Arc<AppState<S, C>>>,
    payload: Result<Json<AddCardRequest>, JsonRejection>,
) -> Result<Response, ReviewError> {
    let request = json_body(payload)?;
    let id = state.service.add_card(&request.front, &request.back).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

async fn export<S: CardStore, C: Clock>(
    State(state): State<Arc<AppState<S, C>>>,
) -> Result<Response, ReviewError> {
    let cards = state.service.list_all().await?;
    let dir = state.export_dir.clone();
    let written = tokio::task::spawn_blocking(move || export_to_dir(&cards, &dir)).await;
    match written {
        Ok(Ok(path)) => Ok(Json(json!({
            "status": "exported",
            "filename": path.to_string_lossy(),
        }))
        .into_response()),
        Ok(Err(e)) => Ok(internal_error(format!("export failed: {e}"))),
        Err(e) => Ok(internal_error(format!("export task failed: {e}"))),
    }
}

fn internal_error(message: String) -> Response {
    error!("{message}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "status": "error", "error": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Card;
    use crate::clock::FakeClock;
    use crate::store::SqliteStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn app(export_dir: PathBuf) -> Router {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let clock = FakeClock::new(Utc.with_ymd_and_hms(2024, 9, 1, 7, 0, 0).unwrap());
        router(Arc::new(ReviewService::with_clock(store, clock)), export_dir)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn add_review_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path().to_path_buf()).await;

        let (status, body) = call(&app, Method::POST, "/cards", Some(json!({"front": "Q", "back": "A"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_i64().unwrap();

        let (status, body) = call(&app, Method::GET, "/review", None).await;
        assert_eq!(status, StatusCode::OK);
        let due: Vec<Card> = serde_json::from_value(body).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, id);

        let (status, body) = call(&app, Method::POST, "/review", Some(json!({"card_id": id, "rating": 5}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["card"]["repetitions"], 1);
        assert_eq!(body["card"]["interval"], 1);

        let (_, body) = call(&app, Method::GET, "/upcoming", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        let (_, body) = call(&app, Method::GET, "/review", None).await;
        assert!(body.as_array().unwrap().is_empty());
        let (_, body) = call(&app, Method::GET, "/cards", None).await;
        assert_eq!(body[0]["front"], "Q");
    }

    #[tokio::test]
    async fn difficulty_is_accepted_as_rating() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path().to_path_buf()).await;
        let (_, body) = call(&app, Method::POST, "/cards", Some(json!({"front": "Q", "back": "A"}))).await;
        let id = body["id"].as_i64().unwrap();

        let (status, body) = call(&app, Method::POST, "/review", Some(json!({"card_id": id, "difficulty": 1}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["card"]["repetitions"], 0);
    }

    #[tokio::test]
    async fn error_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path().to_path_buf()).await;

        let (status, body) = call(&app, Method::POST, "/cards", Some(json!({"front": "Q"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("back"));

        let (status, body) = call(&app, Method::POST, "/review", Some(json!({"card_id": 99, "rating": 3}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "card not found");

        let (_, body) = call(&app, Method::POST, "/cards", Some(json!({"front": "Q", "back": "A"}))).await;
        let id = body["id"].as_i64().unwrap();
        for rating in [0, 6] {
            let (status, _) = call(&app, Method::POST, "/review", Some(json!({"card_id": id, "rating": rating}))).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        }

        let (status, body) = call(&app, Method::POST, "/review", Some(json!({"rating": 3}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn malformed_review_bodies_are_bad_requests() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path().to_path_buf()).await;
        let (_, body) = call(&app, Method::POST, "/cards", Some(json!({"front": "Q", "back": "A"}))).await;
        let id = body["id"].as_i64().unwrap();

        for body in [
            json!({"rating": 3}),
            json!({"card_id": id}),
            json!({"card_id": "x", "rating": 3}),
            json!({"card_id": id, "rating": "good"}),
        ] {
            let (status, body) = call(&app, Method::POST, "/review", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["status"], "error");
            assert!(body["error"].as_str().unwrap().starts_with("invalid input"));
        }

        let (status, body) = call(&app, Method::POST, "/cards", Some(json!({"front": 1, "back": "A"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");

        let (_, body) = call(&app, Method::GET, "/cards", None).await;
        assert_eq!(body[0]["repetitions"], 0);
    }

    #[tokio::test]
    async fn shutdown_wait_ends_when_signal_fails() {
        let failed = async { Err::<(), _>(std::io::Error::other("signal unavailable")) };
        tokio::time::timeout(std::time::Duration::from_secs(1), shutdown_on(failed))
            .await
            .unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), shutdown_on(async { Ok::<(), std::io::Error>(()) }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn export_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path().to_path_buf()).await;
        call(&app, Method::POST, "/cards", Some(json!({"front": "Q", "back": "A"}))).await;

        let (status, body) = call(&app, Method::GET, "/export", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "exported");
        let filename = body["filename"].as_str().unwrap();
        assert!(filename.ends_with(".csv"));
        assert!(std::fs::read_to_string(filename).unwrap().contains("Q,A"));
    }
}
