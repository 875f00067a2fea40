use flashcard_reviewer::client::{Client, ClientError};
use flashcard_reviewer::server::{router, serve};
use flashcard_reviewer::{ReviewService, SqliteStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[tokio::test(flavor = "multi_thread")]
async fn client_round_trip_against_live_server() {
    let export_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let app = router(
        Arc::new(ReviewService::new(store)),
        export_dir.path().to_path_buf(),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve(listener, app, async move {
        let _ = stop_rx.await;
    }));

    tokio::task::spawn_blocking(move || {
        let client = Client::new(&url);

        let id = client
            .add_card(
                "Who is considered the GOAT in basketball?",
                "Michael Jordan",
            )
            .unwrap();
        assert!(client.all_cards().unwrap().iter().any(|c| c.id == id));

        let due = client.due_cards().unwrap();
        assert_eq!(due.len(), 1);

        let card = client.submit_review(id, 4).unwrap();
        assert_eq!(card.memory_state.repetitions, 1);
        assert_eq!(card.memory_state.interval, 1);
        assert!(client.due_cards().unwrap().is_empty());
        assert_eq!(client.upcoming().unwrap()[0].id, id);

        match client.submit_review(id + 1, 4) {
            Err(ClientError::Api { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected 404, got {other:?}"),
        }
        match client.submit_review(id, 6) {
            Err(ClientError::Api { status, .. }) => assert_eq!(status, 422),
            other => panic!("expected 422, got {other:?}"),
        }
        match client.add_card("", "A") {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert!(message.contains("front"));
            }
            other => panic!("expected 400, got {other:?}"),
        }

        let filename = client.export().unwrap();
        assert!(filename.ends_with(".csv"));
    })
    .await
    .unwrap();

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
