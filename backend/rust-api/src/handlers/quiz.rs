use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::{ApiError, ApiResult};
use crate::{
    models::{Principal, QuizView, UserResponseView},
    services::{
        answer_service::AnswerService, quiz_service::QuizService, result_service::ResultService,
        AppState,
    },
};

#[derive(Debug, Deserialize)]
pub struct TopicQuery {
    pub topic: Option<String>,
}

impl TopicQuery {
    /// Unwrap the query string, answering malformed ones with the JSON error body.
    pub fn extract(query: Result<Query<Self>, QueryRejection>) -> ApiResult<Option<String>> {
        match query {
            Ok(Query(query)) => Ok(query.topic),
            Err(rejection) => {
                tracing::warn!("Rejected query string: {}", rejection);
                Err(ApiError::BadRequest("Query string is invalid".to_string()))
            }
        }
    }
}

/// POST /api/quiz?topic= - Generate a quiz for the caller
pub async fn generate_quiz(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<TopicQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let topic = TopicQuery::extract(query)?;
    let service = QuizService::new(state.questions.clone(), state.quizzes.clone());
    let quiz = service
        .generate_quiz(topic.as_deref().unwrap_or_default(), &principal)
        .await?;

    Ok(Json(json!({ "quiz": QuizView::from(&quiz) })))
}

/// POST /api/quiz/{id}/response - Answer one question
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(quiz_id): Path<String>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let service = AnswerService::new(state.quizzes.clone(), state.quiz_locks.clone());
    let response = service.submit_answer(&quiz_id, &principal, &body).await?;

    Ok(Json(json!({ "result": UserResponseView::from(&response) })))
}

/// GET /api/quiz/{id}/result - Score a finished quiz
pub async fn get_result(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(quiz_id): Path<String>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let service = ResultService::new(state.quizzes.clone());
    let result = service
        .get_result(&quiz_id, &principal, !body.is_empty())
        .await?;

    Ok(Json(result))
}
