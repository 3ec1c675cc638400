use chrono::{DateTime, Duration, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::{
    answer::{AnswerResult, UserResponse, UserResponseView},
    bson_datetime_as_chrono,
    question::{Question, QuestionView},
    user::Principal,
};

/// Length of the answering window of every quiz.
pub const QUIZ_WINDOW_MINUTES: i64 = 30;

/// Quiz stored in MongoDB "quizzes" collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user: Principal,
    pub topic: String,
    pub questions: Vec<Question>,
    #[serde(default)]
    pub user_responses: Vec<UserResponse>,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "bson_datetime_as_chrono")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "bson_datetime_as_chrono")]
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    /// Not completed and still inside the window.
    Open,
    /// The window has passed, whether or not the flag is already set.
    Expired,
    /// Completed inside the window; no more answers are accepted.
    Closed,
}

impl Quiz {
    pub fn new(
        topic: impl Into<String>,
        owner: Principal,
        questions: Vec<Question>,
        now: DateTime<Utc>,
    ) -> Self {
        Quiz {
            id: None,
            user: owner,
            topic: topic.into(),
            questions,
            user_responses: Vec::new(),
            completed: false,
            start_time: now,
            end_time: now + Duration::minutes(QUIZ_WINDOW_MINUTES),
        }
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> QuizState {
        if now > self.end_time {
            QuizState::Expired
        } else if self.completed {
            QuizState::Closed
        } else {
            QuizState::Open
        }
    }

    pub fn is_owned_by(&self, principal: &Principal) -> bool {
        self.user.username == principal.username
    }

    pub fn find_question(&self, question_id: &ObjectId) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == question_id)
    }

    pub fn has_response_for(&self, question_id: &ObjectId) -> bool {
        self.user_responses
            .iter()
            .any(|r| &r.question_id == question_id)
    }

    /// Append a response and close the quiz once every question is covered.
    /// Returns true when this response completed the quiz.
    pub fn record_response(&mut self, response: UserResponse) -> bool {
        self.user_responses.push(response);
        if !self.completed && self.user_responses.len() == self.questions.len() {
            self.completed = true;
            return true;
        }
        false
    }

    pub fn correct_count(&self) -> usize {
        self.user_responses
            .iter()
            .filter(|r| r.result == AnswerResult::Right)
            .count()
    }
}

/// Quiz as returned to the taker: responses and completion flag withheld.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizView {
    pub id: String,
    pub user: Principal,
    pub topic: String,
    pub questions: Vec<QuestionView>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl From<&Quiz> for QuizView {
    fn from(quiz: &Quiz) -> Self {
        QuizView {
            id: quiz.id.map(|id| id.to_hex()).unwrap_or_default(),
            user: quiz.user.clone(),
            topic: quiz.topic.clone(),
            questions: quiz.questions.iter().map(QuestionView::from).collect(),
            start_time: quiz.start_time,
            end_time: quiz.end_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultStats {
    pub total_questions_answered: usize,
    pub number_of_correct_answers: usize,
    pub total_questions: usize,
    pub percentage: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResult {
    pub quiz: QuizView,
    pub user_responses: Vec<UserResponseView>,
    pub stats: ResultStats,
}
