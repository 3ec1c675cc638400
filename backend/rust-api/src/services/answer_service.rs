use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

use super::{parse_object_id, store::QuizStore, ServiceError, ServiceResult};
use crate::metrics::{ANSWERS_SUBMITTED_TOTAL, QUIZZES_COMPLETED_TOTAL};
use crate::models::{AnswerResult, Principal, QuizState, SubmitAnswerRequest, UserResponse};
use crate::utils::keyed_lock::KeyedLocks;

pub struct AnswerService {
    quizzes: Arc<dyn QuizStore>,
    locks: Arc<KeyedLocks<ObjectId>>,
}

impl AnswerService {
    pub fn new(quizzes: Arc<dyn QuizStore>, locks: Arc<KeyedLocks<ObjectId>>) -> Self {
        Self { quizzes, locks }
    }

    /// Record one answer for one question of a quiz.
    ///
    /// Checks run in a fixed order and the first failure wins: quiz id,
    /// existence, ownership, expiry, closed flag, body shape, question id,
    /// question membership and choice validity, duplicate answer. An expired
    /// quiz is closed durably even though the submission itself is rejected.
    pub async fn submit_answer(
        &self,
        quiz_id: &str,
        principal: &Principal,
        body: &[u8],
    ) -> ServiceResult<UserResponse> {
        let quiz_id = parse_object_id(quiz_id, "Quiz ID")?;

        // Concurrent submissions for one quiz would otherwise overwrite each
        // other's user_responses.
        let _guard = self.locks.lock(&quiz_id).await;

        let mut quiz = self
            .quizzes
            .find_by_id(&quiz_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Quiz with given ID not found"))?;

        if !quiz.is_owned_by(principal) {
            tracing::warn!(
                "User {} tried to answer quiz {} owned by {}",
                principal.username,
                quiz_id,
                quiz.user.username
            );
            return Err(ServiceError::forbidden("Quiz not started by the same user"));
        }

        match quiz.state_at(Utc::now()) {
            QuizState::Open => {}
            QuizState::Expired => {
                self.quizzes.mark_completed(&quiz_id).await?;
                QUIZZES_COMPLETED_TOTAL.with_label_values(&["expired"]).inc();
                tracing::info!("Quiz {} expired and was closed", quiz_id);
                return Err(ServiceError::invalid_state(
                    "Quiz has expired. Start a new quiz",
                ));
            }
            QuizState::Closed => {
                return Err(ServiceError::invalid_state(
                    "Quiz has already ended. Start a new quiz",
                ));
            }
        }

        let submission = SubmitAnswerRequest::parse(body).map_err(ServiceError::InvalidFields)?;
        let question_id = parse_object_id(&submission.question_id, "Question ID")?;

        let question = quiz.find_question(&question_id).ok_or_else(|| {
            ServiceError::not_found("Question with given ID not found in this particular quiz")
        })?;
        if !question.accepts_choice(&submission.choice) {
            return Err(ServiceError::invalid_input(
                "User choice is invalid for this current question",
            ));
        }

        if quiz.has_response_for(&question_id) {
            return Err(ServiceError::invalid_input(
                "Question with given ID has already been answered",
            ));
        }

        let correct_answer = question.normalized_correct_answer();
        let result = if submission.choice == correct_answer {
            AnswerResult::Right
        } else {
            AnswerResult::Wrong
        };
        let response = UserResponse {
            question_id,
            response: submission.choice,
            result,
            correct_answer,
        };

        let completed_now = quiz.record_response(response.clone());

        self.quizzes
            .save_progress(&quiz_id, &quiz.user_responses, quiz.completed)
            .await?;

        ANSWERS_SUBMITTED_TOTAL
            .with_label_values(&[result.as_str()])
            .inc();
        if completed_now {
            QUIZZES_COMPLETED_TOTAL
                .with_label_values(&["all_answered"])
                .inc();
        }
        tracing::info!(
            "Answer recorded: quiz={}, question={}, result={}, answered={}/{}",
            quiz_id,
            question_id,
            result.as_str(),
            quiz.user_responses.len(),
            quiz.questions.len()
        );

        Ok(response)
    }
}
