use axum::{
    extract::{multipart::MultipartRejection, rejection::QueryRejection, Multipart, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use super::{quiz::TopicQuery, ApiError, ApiResult};
use crate::services::{question_service::QuestionService, AppState};

fn question_service(state: &AppState) -> QuestionService {
    QuestionService::new(state.questions.clone(), state.topics.clone())
}

/// POST /api/questions - Upload a questions file for a topic (admin)
///
/// Multipart form with a `topic` text field and a `questions_file` JSON file.
pub async fn upload_questions(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let mut multipart = multipart.map_err(|e| {
        tracing::warn!("Rejected questions upload: {}", e);
        ApiError::BadRequest("Expected a multipart form with topic and questions_file".to_string())
    })?;

    let mut topic = None;
    let mut file = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Malformed multipart body: {}", e);
        ApiError::BadRequest("Malformed multipart form".to_string())
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("topic") => {
                topic = Some(field.text().await.map_err(|_| {
                    ApiError::BadRequest("Topic is not valid text".to_string())
                })?);
            }
            Some("questions_file") => {
                file = Some(field.bytes().await.map_err(|_| {
                    ApiError::BadRequest("Unable to read questions file".to_string())
                })?);
            }
            _ => {}
        }
    }

    let summary = question_service(&state)
        .upload_questions(topic.as_deref(), file.as_deref())
        .await?;

    Ok(Json(summary))
}

/// GET /api/questions?topic= - List the bank for a topic (admin)
pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TopicQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let topic = TopicQuery::extract(query)?;
    let questions = question_service(&state)
        .list_by_topic(topic.as_deref())
        .await?;

    Ok(Json(json!({ "questions": questions })))
}

/// GET /api/topics - Distinct topic names
pub async fn list_topics(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let topics = question_service(&state).list_topics().await?;

    Ok(Json(json!({ "topics": topics })))
}
