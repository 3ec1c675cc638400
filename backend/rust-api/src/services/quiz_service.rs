use chrono::Utc;
use std::sync::Arc;

use super::{
    store::{QuestionStore, QuizStore},
    ServiceError, ServiceResult,
};
use crate::metrics::QUIZZES_GENERATED_TOTAL;
use crate::models::{Principal, Quiz};

pub struct QuizService {
    questions: Arc<dyn QuestionStore>,
    quizzes: Arc<dyn QuizStore>,
}

impl QuizService {
    pub fn new(questions: Arc<dyn QuestionStore>, quizzes: Arc<dyn QuizStore>) -> Self {
        Self { questions, quizzes }
    }

    /// Build and persist a quiz from every question matching `topic`.
    ///
    /// Questions are snapshotted in store order; the quiz closes for answers
    /// thirty minutes after generation.
    pub async fn generate_quiz(&self, topic: &str, principal: &Principal) -> ServiceResult<Quiz> {
        let topic = topic.trim();
        if topic.is_empty() {
            QUIZZES_GENERATED_TOTAL
                .with_label_values(&["invalid_input"])
                .inc();
            return Err(ServiceError::invalid_input("Topic not provided in URL"));
        }

        let questions = self.questions.search_by_topic(topic).await.map_err(|e| {
            QUIZZES_GENERATED_TOTAL
                .with_label_values(&["storage_error"])
                .inc();
            ServiceError::Storage(e)
        })?;

        if questions.is_empty() {
            QUIZZES_GENERATED_TOTAL
                .with_label_values(&["not_found"])
                .inc();
            return Err(ServiceError::not_found("No questions found with this topic"));
        }

        let mut quiz = Quiz::new(topic, principal.clone(), questions, Utc::now());

        let id = self.quizzes.insert(&quiz).await.map_err(|e| {
            QUIZZES_GENERATED_TOTAL
                .with_label_values(&["storage_error"])
                .inc();
            ServiceError::Storage(e)
        })?;
        quiz.id = Some(id);

        QUIZZES_GENERATED_TOTAL.with_label_values(&["created"]).inc();
        tracing::info!(
            "Quiz {} generated for user {} on topic '{}' with {} questions",
            id,
            principal.username,
            topic,
            quiz.questions.len()
        );

        Ok(quiz)
    }
}
