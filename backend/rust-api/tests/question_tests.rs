mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;

use common::{authed, create_test_app, send, start_quiz, token_for};

const BOUNDARY: &str = "quiz-test-boundary";

const CAPITALS_FILE: &str = r#"[
    {"question": "Capital of France?", "options": ["Paris", "Madrid"], "correct_answer": "Paris"},
    {"question": "Capital of Spain?", "options": ["Paris", "Madrid"], "correct_answer": "Madrid",
     "distractors": ["Barcelona"]}
]"#;

fn multipart_upload(token: &str, topic: Option<&str>, file: Option<&str>) -> Request<Body> {
    let mut body = String::new();
    if let Some(topic) = topic {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"topic\"\r\n\r\n{topic}\r\n"
        ));
    }
    if let Some(file) = file {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"questions_file\"; \
             filename=\"questions.json\"\r\nContent-Type: application/json\r\n\r\n{file}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/api/questions")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_admin_uploads_and_lists_questions() {
    let app = create_test_app();
    let admin = token_for("root", true);

    let (status, body) = send(
        &app.router,
        multipart_upload(&admin, Some("capitals"), Some(CAPITALS_FILE)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(
        body,
        json!({ "number_of_questions_inserted": 2, "topic": "capitals" })
    );

    let (status, body) = send(
        &app.router,
        authed("GET", "/api/questions?topic=capitals", &admin, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[1]["correct_answer"], "Madrid");
    assert_eq!(questions[1]["distractors"], json!(["Barcelona"]));

    let alice = token_for("alice", false);
    let (status, body) = send(&app.router, authed("GET", "/api/topics", &alice, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["topics"], json!(["capitals"]));

    let (_, question_ids) = start_quiz(&app.router, &alice, "capitals").await;
    assert_eq!(question_ids.len(), 2);
}

#[tokio::test]
async fn test_upload_rejects_incomplete_forms() {
    let app = create_test_app();
    let admin = token_for("root", true);

    let (status, _) = send(&app.router, multipart_upload(&admin, None, Some(CAPITALS_FILE))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app.router, multipart_upload(&admin, Some("capitals"), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app.router,
        multipart_upload(&admin, Some("capitals"), Some("{\"question\": ")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON file. Please upload valid JSON");

    let (status, _) = send(
        &app.router,
        authed("POST", "/api/questions", &admin, Some(json!({ "topic": "capitals" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_question_bank_is_admin_only() {
    let app = create_test_app();
    let alice = token_for("alice", false);

    let (status, body) = send(
        &app.router,
        multipart_upload(&alice, Some("capitals"), Some(CAPITALS_FILE)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app.router,
        authed("GET", "/api/questions?topic=capitals", &alice, None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        authed("GET", "/api/questions", &token_for("root", true), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app.router,
        authed(
            "GET",
            "/api/questions?topic=capitals&topic=math",
            &token_for("root", true),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Query string is invalid");
}

#[tokio::test]
async fn test_health_and_metrics_are_public() {
    let app = create_test_app();

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
}
