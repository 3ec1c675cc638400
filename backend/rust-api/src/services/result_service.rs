use std::sync::Arc;

use super::{parse_object_id, store::QuizStore, ServiceError, ServiceResult};
use crate::models::{
    Principal, Quiz, QuizResult, QuizView, ResultStats, UserResponseView,
};

/// Percentage of correct answers with exactly two decimals, e.g. "33.33".
pub fn format_percentage(correct: usize, total: usize) -> String {
    if total == 0 {
        return "0.00".to_string();
    }
    format!("{:.2}", correct as f64 / total as f64 * 100.0)
}

pub fn compute_stats(quiz: &Quiz) -> ResultStats {
    let correct = quiz.correct_count();
    ResultStats {
        total_questions_answered: quiz.user_responses.len(),
        number_of_correct_answers: correct,
        total_questions: quiz.questions.len(),
        percentage: format_percentage(correct, quiz.questions.len()),
    }
}

pub struct ResultService {
    quizzes: Arc<dyn QuizStore>,
}

impl ResultService {
    pub fn new(quizzes: Arc<dyn QuizStore>) -> Self {
        Self { quizzes }
    }

    /// Read-only scoring of a closed quiz. Admins may view any result, other
    /// users only their own.
    pub async fn get_result(
        &self,
        quiz_id: &str,
        principal: &Principal,
        has_body: bool,
    ) -> ServiceResult<QuizResult> {
        let quiz_id = parse_object_id(quiz_id, "Quiz ID")?;

        let quiz = self
            .quizzes
            .find_by_id(&quiz_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Quiz with given ID not found"))?;

        if has_body {
            return Err(ServiceError::invalid_input(
                "Body not expected for this request",
            ));
        }

        if !principal.is_admin && !quiz.is_owned_by(principal) {
            tracing::warn!(
                "User {} denied access to result of quiz {}",
                principal.username,
                quiz_id
            );
            return Err(ServiceError::forbidden(
                "You don't have permissions to view this quiz's result",
            ));
        }

        if !quiz.completed {
            return Err(ServiceError::invalid_state(
                "Quiz has not ended yet. Answer all questions to get a result",
            ));
        }

        let stats = compute_stats(&quiz);
        tracing::debug!(
            "Result for quiz {}: {}/{} ({}%)",
            quiz_id,
            stats.number_of_correct_answers,
            stats.total_questions,
            stats.percentage
        );

        Ok(QuizResult {
            quiz: QuizView::from(&quiz),
            user_responses: quiz
                .user_responses
                .iter()
                .map(UserResponseView::from)
                .collect(),
            stats,
        })
    }
}
