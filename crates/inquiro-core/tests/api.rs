//! HTTP contract tests against an in-process stub backend.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use inquiro_core::{
    resolve, ApiError, InputError, InquiroApi, MemorySessionStore, Resolution, Route,
    SessionEvent, SessionEvents, SessionStore,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const VALID_TOKEN: &str = "jwt-alice";

#[derive(Clone, Default)]
struct Stub {
    hits: Arc<AtomicUsize>,
    upload: Arc<Mutex<Option<(String, String, usize)>>>,
    flashcard_count: Arc<Mutex<Option<String>>>,
}

impl Stub {
    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

fn authorized(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {}", VALID_TOKEN);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        // Deliberately not JSON: a 401 body must never be parsed.
        _ => Err((StatusCode::UNAUTHORIZED, "<html>Invalid token</html>").into_response()),
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

async fn login(State(stub): State<Stub>, Form(form): Form<HashMap<String, String>>) -> Response {
    stub.hit();
    let username = form.get("username").map(String::as_str);
    let password = form.get("password").map(String::as_str);
    if username == Some("alice") && password == Some("secret") {
        Json(json!({ "access_token": VALID_TOKEN, "token_type": "bearer" })).into_response()
    } else {
        detail(StatusCode::UNAUTHORIZED, "Invalid username or password")
    }
}

async fn register(State(stub): State<Stub>, Json(body): Json<Value>) -> Response {
    stub.hit();
    if body["username"] == "taken" {
        return detail(StatusCode::BAD_REQUEST, "Username or email already exists");
    }
    Json(json!({ "message": "User registered successfully", "user_id": "u-1" })).into_response()
}

async fn documents(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    stub.hit();
    if let Err(response) = authorized(&headers) {
        return response;
    }
    Json(json!({
        "documents": [
            { "id": "d1", "title": "biology.pdf" },
            { "id": "d2", "title": "history.pdf" }
        ]
    }))
    .into_response()
}

async fn upload(
    State(stub): State<Stub>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    stub.hit();
    if let Err(response) = authorized(&headers) {
        return response;
    }
    let Ok(Some(field)) = multipart.next_field().await else {
        return detail(StatusCode::BAD_REQUEST, "Multipart form must include a file");
    };
    let name = field.name().unwrap_or_default().to_string();
    let file_name = field.file_name().unwrap_or_default().to_string();
    let size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
    *stub.upload.lock() = Some((name, file_name, size));
    Json(json!({ "id": "doc-new" })).into_response()
}

async fn query(State(stub): State<Stub>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    stub.hit();
    if let Err(response) = authorized(&headers) {
        return response;
    }
    if body["doc_id"] == "stale" {
        return detail(StatusCode::NOT_FOUND, "Document not found or not owned by user");
    }
    if body["question"] == "malformed" {
        return Json(json!({ "query_id": "q-2" })).into_response();
    }
    Json(json!({
        "query_id": "q-1",
        "answer": format!("Answer to: {}", body["question"].as_str().unwrap_or_default()),
        "documents": [{ "id": body["doc_id"], "title": "biology.pdf" }]
    }))
    .into_response()
}

async fn generate_flashcards(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    stub.hit();
    if let Err(response) = authorized(&headers) {
        return response;
    }
    *stub.flashcard_count.lock() = params.get("num_flashcards").cloned();
    if id != "d1" {
        return detail(StatusCode::NOT_FOUND, "Document not found");
    }
    let count: usize = params
        .get("num_flashcards")
        .and_then(|n| n.parse().ok())
        .unwrap_or(10);
    let cards: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "flashcard_id": format!("{}-{}", id, i),
                "question": format!("Q{}", i),
                "answer": format!("A{}", i),
                "created_at": "2024-05-01T10:00:00"
            })
        })
        .collect();
    Json(json!({
        "id": id,
        "flashcards": cards,
        "message": format!("Generated {} flashcards for biology.pdf", count)
    }))
    .into_response()
}

async fn saved_flashcards(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    stub.hit();
    if let Err(response) = authorized(&headers) {
        return response;
    }
    if id != "d1" {
        return detail(StatusCode::NOT_FOUND, "No flashcards found for this document");
    }
    Json(json!([
        { "flashcard_id": "c1", "question": "What is a cell?", "answer": "The basic unit of life" },
        { "flashcard_id": "c2", "question": "What is DNA?", "answer": "Genetic material" }
    ]))
    .into_response()
}

async fn spawn_backend() -> (String, Stub) {
    let stub = Stub::default();
    let app = Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/documents", get(documents))
        .route("/upload", post(upload))
        .route("/query", post(query))
        .route(
            "/flashcards/{id}",
            post(generate_flashcards).get(saved_flashcards),
        )
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), stub)
}

fn api_with(
    base_url: &str,
    token: Option<&str>,
) -> (InquiroApi, Arc<MemorySessionStore>, SessionEvents) {
    let store = Arc::new(match token {
        Some(token) => MemorySessionStore::with_token(token),
        None => MemorySessionStore::new(),
    });
    let events = SessionEvents::default();
    let api = InquiroApi::new(base_url, store.clone(), events.clone());
    (api, store, events)
}

#[tokio::test]
async fn test_login_stores_token_and_opens_dashboard() {
    let (url, _stub) = spawn_backend().await;
    let (api, store, events) = api_with(&url, None);
    let mut rx = events.subscribe();

    api.login("alice", "secret").await.unwrap();

    assert_eq!(store.get().as_deref(), Some(VALID_TOKEN));
    assert_eq!(rx.try_recv().unwrap(), SessionEvent::LoggedIn);
    assert_eq!(
        resolve(Route::Login, store.is_authenticated()),
        Resolution::Redirect(Route::Dashboard)
    );
    assert_eq!(
        resolve(Route::Dashboard, store.is_authenticated()),
        Resolution::Render(Route::Dashboard)
    );
}

#[tokio::test]
async fn test_bad_login_keeps_store_empty_and_reports_detail() {
    let (url, stub) = spawn_backend().await;
    let (api, store, _events) = api_with(&url, None);

    let err = api.login("alice", "wrong").await.unwrap_err();

    assert_eq!(
        err,
        ApiError::RequestRejected {
            status: 401,
            message: "Invalid username or password".to_string()
        }
    );
    assert!(!store.is_authenticated());
    assert_eq!(stub.hits(), 1);
}

#[tokio::test]
async fn test_register_success_and_conflict() {
    let (url, _stub) = spawn_backend().await;
    let (api, store, _events) = api_with(&url, None);

    let registration = api.register("bob", "bob@example.com", "pw").await.unwrap();
    assert_eq!(registration.user_id.as_deref(), Some("u-1"));
    assert!(!store.is_authenticated());

    let err = api.register("taken", "t@example.com", "pw").await.unwrap_err();
    assert_eq!(err.to_string(), "Username or email already exists");
}

#[tokio::test]
async fn test_missing_token_sends_nothing() {
    let (url, stub) = spawn_backend().await;
    let (api, _store, _events) = api_with(&url, None);

    let err = api.list_documents().await.unwrap_err();

    assert_eq!(err, ApiError::AuthenticationMissing);
    assert_eq!(stub.hits(), 0);
}

#[tokio::test]
async fn test_list_documents_with_bearer() {
    let (url, _stub) = spawn_backend().await;
    let (api, _store, _events) = api_with(&url, Some(VALID_TOKEN));

    let docs = api.list_documents().await.unwrap();

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].title, "biology.pdf");
}

#[tokio::test]
async fn test_upload_without_file_sends_nothing() {
    let (url, stub) = spawn_backend().await;
    let (api, _store, _events) = api_with(&url, Some(VALID_TOKEN));

    let err = api.upload_document(None).await.unwrap_err();

    assert_eq!(err, ApiError::Invalid(InputError::NoFileSelected));
    assert_eq!(err.to_string(), "Please select a file to upload");
    assert_eq!(stub.hits(), 0);
}

#[tokio::test]
async fn test_upload_sends_single_file_part() {
    let (url, stub) = spawn_backend().await;
    let (api, _store, _events) = api_with(&url, Some(VALID_TOKEN));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.pdf");
    std::fs::write(&path, b"%PDF-1.4 fake").unwrap();

    let doc = api.upload_document(Some(&path)).await.unwrap();

    assert_eq!(doc.id, "doc-new");
    assert_eq!(doc.title, "notes.pdf");
    let recorded = stub.upload.lock().clone();
    assert_eq!(
        recorded,
        Some(("file".to_string(), "notes.pdf".to_string(), 13))
    );
}

#[tokio::test]
async fn test_query_unauthorized_publishes_once() {
    let (url, stub) = spawn_backend().await;
    let (api, store, events) = api_with(&url, Some("expired-token"));
    let mut rx = events.subscribe();

    let err = api.query("What is a cell?", Some("d1")).await.unwrap_err();

    assert_eq!(err, ApiError::AuthenticationExpired);
    assert_eq!(
        rx.try_recv().unwrap(),
        SessionEvent::Expired {
            path: "/query".to_string()
        }
    );
    assert!(rx.try_recv().is_err());
    assert_eq!(stub.hits(), 1);
    // With a subscriber present, clearing belongs to the subscriber.
    assert!(store.is_authenticated());
}

#[tokio::test]
async fn test_unauthorized_without_subscriber_clears_store() {
    let (url, _stub) = spawn_backend().await;
    let (api, store, _events) = api_with(&url, Some("expired-token"));

    let err = api.list_documents().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(!store.is_authenticated());
    assert_eq!(
        resolve(Route::Dashboard, store.is_authenticated()),
        Resolution::Redirect(Route::Login)
    );
}

#[tokio::test]
async fn test_query_success_and_failures() {
    let (url, _stub) = spawn_backend().await;
    let (api, _store, _events) = api_with(&url, Some(VALID_TOKEN));

    let answer = api.query("What is a cell?", Some("d1")).await.unwrap();
    assert_eq!(answer.answer, "Answer to: What is a cell?");
    assert_eq!(answer.query_id.as_deref(), Some("q-1"));

    let err = api.query("What is a cell?", Some("stale")).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::RequestRejected {
            status: 404,
            message: "Document not found or not owned by user".to_string()
        }
    );

    let err = api.query("malformed", Some("d1")).await.unwrap_err();
    assert!(matches!(err, ApiError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_flashcard_count_checked_before_network() {
    let (url, stub) = spawn_backend().await;
    let (api, _store, _events) = api_with(&url, Some(VALID_TOKEN));

    let err = api.generate_flashcards(Some("d1"), 25).await.unwrap_err();

    assert_eq!(
        err,
        ApiError::Invalid(InputError::FlashcardCount {
            requested: 25,
            min: 1,
            max: 20
        })
    );
    assert_eq!(stub.hits(), 0);
}

#[tokio::test]
async fn test_generate_and_fetch_flashcards() {
    let (url, stub) = spawn_backend().await;
    let (api, _store, _events) = api_with(&url, Some(VALID_TOKEN));

    let batch = api.generate_flashcards(Some("d1"), 3).await.unwrap();
    assert_eq!(batch.flashcards.len(), 3);
    assert_eq!(batch.flashcards[2].id.as_deref(), Some("d1-2"));
    assert_eq!(stub.flashcard_count.lock().as_deref(), Some("3"));

    let saved = api.fetch_flashcards(Some("d1")).await.unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].question, "What is a cell?");

    let err = api.fetch_flashcards(Some("d9")).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_document_id_cannot_rewrite_the_request() {
    let (url, stub) = spawn_backend().await;
    let (api, _store, _events) = api_with(&url, Some(VALID_TOKEN));

    for id in ["d1#stale", "d1/extra", "d1?x=1"] {
        let err = api.fetch_flashcards(Some(id)).await.unwrap_err();
        assert_eq!(err.status(), Some(404), "fetch with {:?}", id);
    }

    let err = api
        .generate_flashcards(Some("d1?num_flashcards=50&x="), 3)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(stub.flashcard_count.lock().as_deref(), Some("3"));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let (api, store, _events) = api_with(&format!("http://{}", addr), Some(VALID_TOKEN));

    let err = api.list_documents().await.unwrap_err();

    assert!(matches!(err, ApiError::TransportFailure(_)));
    assert!(store.is_authenticated());
}
