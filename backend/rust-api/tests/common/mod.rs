#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use quiz_api::{
    config::Config,
    create_router,
    middlewares::auth::{JwtClaims, JwtService},
    models::QuestionUpload,
    services::{store::memory::MemoryStore, store::QuestionStore, AppState},
};

pub const SIGNING_KEY: &str = "integration-test-signing-key";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub fn create_test_app() -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let store = Arc::new(MemoryStore::new());
    let state = AppState::with_store(Config::in_memory(SIGNING_KEY), store.clone());

    TestApp {
        router: create_router(Arc::new(state)),
        store,
    }
}

/// Mint a bearer token directly, skipping the login round trip.
pub fn token_for(username: &str, is_admin: bool) -> String {
    let now = Utc::now();
    JwtService::new(SIGNING_KEY)
        .generate_token(JwtClaims {
            sub: username.to_string(),
            is_admin,
            exp: (now + Duration::minutes(45)).timestamp() as usize,
            iat: now.timestamp() as usize,
        })
        .expect("Failed to sign test token")
}

pub fn basic_auth(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        general_purpose::STANDARD.encode(format!("{}:{}", username, password))
    )
}

/// Two "capitals" questions: France/Paris first, Germany/Berlin second.
pub async fn seed_capitals(store: &MemoryStore) {
    let questions: Vec<_> = [("Capital of France?", "Paris"), ("Capital of Germany?", "Berlin")]
        .into_iter()
        .map(|(prompt, answer)| {
            QuestionUpload {
                question: prompt.to_string(),
                options: vec![answer.to_string(), "Madrid".to_string(), "Rome".to_string()],
                correct_answer: answer.to_string(),
                distractors: None,
            }
            .into_question("capitals")
        })
        .collect();
    store
        .insert_many(&questions)
        .await
        .expect("Failed to seed questions");
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Router failed to respond");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

pub fn authed(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("Failed to build request"),
        None => builder.body(Body::empty()).expect("Failed to build request"),
    }
}

/// Generate a quiz for `token` and return `(quiz_id, question ids in order)`.
pub async fn start_quiz(router: &Router, token: &str, topic: &str) -> (String, Vec<String>) {
    let (status, body) = send(
        router,
        authed("POST", &format!("/api/quiz?topic={}", topic), token, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "quiz generation failed: {}", body);

    let quiz = &body["quiz"];
    let ids = quiz["questions"]
        .as_array()
        .expect("questions array")
        .iter()
        .map(|q| q["id"].as_str().expect("question id").to_string())
        .collect();
    (quiz["id"].as_str().expect("quiz id").to_string(), ids)
}
