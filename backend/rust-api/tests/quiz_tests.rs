mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use quiz_api::{
    models::{Principal, Quiz},
    services::store::{QuestionStore, QuizStore},
};
use serde_json::json;

use common::{authed, create_test_app, seed_capitals, send, start_quiz, token_for};

fn answer(question_id: &str, choice: &str) -> Option<serde_json::Value> {
    Some(json!({ "question_id": question_id, "choice": choice }))
}

#[tokio::test]
async fn test_full_quiz_flow_scores_half() {
    let app = create_test_app();
    seed_capitals(&app.store).await;
    let alice = token_for("alice", false);

    let (quiz_id, questions) = start_quiz(&app.router, &alice, "capitals").await;
    assert_eq!(questions.len(), 2);

    let uri = format!("/api/quiz/{}/response", quiz_id);
    let (status, body) = send(&app.router, authed("POST", &uri, &alice, answer(&questions[0], " PARIS "))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["result"]["result"], "Right");
    assert_eq!(body["result"]["response"], "paris");
    assert_eq!(body["result"]["correct_answer"], "paris");

    let (status, body) = send(&app.router, authed("POST", &uri, &alice, answer(&questions[1], "Madrid"))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["result"]["result"], "Wrong");
    assert_eq!(body["result"]["correct_answer"], "berlin");

    let (status, body) = send(
        &app.router,
        authed("GET", &format!("/api/quiz/{}/result", quiz_id), &alice, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["stats"]["total_questions_answered"], 2);
    assert_eq!(body["stats"]["number_of_correct_answers"], 1);
    assert_eq!(body["stats"]["total_questions"], 2);
    assert_eq!(body["stats"]["percentage"], "50.00");
    assert_eq!(body["user_responses"].as_array().unwrap().len(), 2);
    assert_eq!(body["quiz"]["id"], quiz_id.as_str());
}

#[tokio::test]
async fn test_quiz_view_hides_answer_key() {
    let app = create_test_app();
    seed_capitals(&app.store).await;
    let alice = token_for("alice", false);

    let (status, body) = send(&app.router, authed("POST", "/api/quiz?topic=capitals", &alice, None)).await;
    assert_eq!(status, StatusCode::OK);
    let question = &body["quiz"]["questions"][0];
    assert_eq!(question["question"], "Capital of France?");
    assert!(question.get("correct_answer").is_none());
    assert!(question.get("distractors").is_none());
    assert_eq!(body["quiz"]["user"]["username"], "alice");
}

#[tokio::test]
async fn test_generate_quiz_errors() {
    let app = create_test_app();
    seed_capitals(&app.store).await;
    let alice = token_for("alice", false);

    let (status, _) = send(&app.router, authed("POST", "/api/quiz", &alice, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app.router, authed("POST", "/api/quiz?topic=astronomy", &alice, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No questions found with this topic");

    let (status, _) = send(&app.router, authed("POST", "/api/quiz?topic=capitals", "not-a-token", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_storage_outage_is_internal_error() {
    let app = create_test_app();
    seed_capitals(&app.store).await;
    app.store.set_failing(true);

    let (status, body) = send(
        &app.router,
        authed("POST", "/api/quiz?topic=capitals", &token_for("alice", false), None),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_other_user_cannot_answer_or_read() {
    let app = create_test_app();
    seed_capitals(&app.store).await;
    let alice = token_for("alice", false);
    let bob = token_for("bob", false);

    let (quiz_id, questions) = start_quiz(&app.router, &alice, "capitals").await;
    let uri = format!("/api/quiz/{}/response", quiz_id);

    let (status, body) = send(&app.router, authed("POST", &uri, &bob, answer(&questions[0], "Paris"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Quiz not started by the same user");

    for q in &questions {
        let (status, _) = send(&app.router, authed("POST", &uri, &alice, answer(q, "Paris"))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let result_uri = format!("/api/quiz/{}/result", quiz_id);
    let (status, _) = send(&app.router, authed("GET", &result_uri, &bob, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app.router, authed("GET", &result_uri, &token_for("root", true), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["percentage"], "50.00");
}

#[tokio::test]
async fn test_submission_validation() {
    let app = create_test_app();
    seed_capitals(&app.store).await;
    let alice = token_for("alice", false);
    let (quiz_id, questions) = start_quiz(&app.router, &alice, "capitals").await;
    let uri = format!("/api/quiz/{}/response", quiz_id);

    let (status, body) = send(&app.router, authed("POST", &uri, &alice, Some(json!({})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["errors"],
        json!([
            "question_id should be included in the body",
            "choice should be included in the body"
        ])
    );

    let (status, body) = send(&app.router, authed("POST", &uri, &alice, answer(&questions[0], "Lisbon"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User choice is invalid for this current question");

    let (status, _) = send(&app.router, authed("POST", &uri, &alice, answer("zzz", "Paris"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        authed("POST", &uri, &alice, answer(&mongodb::bson::oid::ObjectId::new().to_hex(), "Paris")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app.router, authed("POST", &uri, &alice, answer(&questions[0], "Paris"))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app.router, authed("POST", &uri, &alice, answer(&questions[0], "Rome"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app.router,
        authed("GET", &format!("/api/quiz/{}/result", quiz_id), &alice, None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_completed_quiz_rejects_more_answers() {
    let app = create_test_app();
    seed_capitals(&app.store).await;
    let alice = token_for("alice", false);
    let (quiz_id, questions) = start_quiz(&app.router, &alice, "capitals").await;
    let uri = format!("/api/quiz/{}/response", quiz_id);

    for q in &questions {
        send(&app.router, authed("POST", &uri, &alice, answer(q, "Rome"))).await;
    }

    let (status, body) = send(&app.router, authed("POST", &uri, &alice, answer(&questions[0], "Paris"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Quiz has already ended. Start a new quiz");
}

#[tokio::test]
async fn test_expired_quiz_is_closed_on_submission() {
    let app = create_test_app();
    seed_capitals(&app.store).await;
    let questions = app.store.search_by_topic("capitals").await.unwrap();
    let first = questions[0].id.to_hex();
    let quiz = Quiz::new(
        "capitals",
        Principal::new("alice", false),
        questions,
        Utc::now() - Duration::minutes(31),
    );
    let quiz_id = app.store.put_quiz(quiz);
    let alice = token_for("alice", false);

    let (status, body) = send(
        &app.router,
        authed(
            "POST",
            &format!("/api/quiz/{}/response", quiz_id.to_hex()),
            &alice,
            answer(&first, "Paris"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Quiz has expired. Start a new quiz");

    let stored = app.store.find_by_id(&quiz_id).await.unwrap().unwrap();
    assert!(stored.completed);
    assert!(stored.user_responses.is_empty());

    let (status, body) = send(
        &app.router,
        authed("GET", &format!("/api/quiz/{}/result", quiz_id.to_hex()), &alice, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["percentage"], "0.00");
}

#[tokio::test]
async fn test_result_rejects_body_and_bad_ids() {
    let app = create_test_app();
    seed_capitals(&app.store).await;
    let alice = token_for("alice", false);
    let (quiz_id, _) = start_quiz(&app.router, &alice, "capitals").await;

    let (status, body) = send(
        &app.router,
        authed("GET", &format!("/api/quiz/{}/result", quiz_id), &alice, Some(json!({"x": 1}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Body not expected for this request");

    let (status, _) = send(&app.router, authed("GET", "/api/quiz/not-an-id/result", &alice, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown = mongodb::bson::oid::ObjectId::new().to_hex();
    let (status, _) = send(
        &app.router,
        authed("GET", &format!("/api/quiz/{}/result", unknown), &alice, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_query_string_gets_json_error() {
    let app = create_test_app();
    seed_capitals(&app.store).await;
    let alice = token_for("alice", false);

    let (status, body) = send(
        &app.router,
        authed("POST", "/api/quiz?topic=capitals&topic=math", &alice, None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Query string is invalid");
}
