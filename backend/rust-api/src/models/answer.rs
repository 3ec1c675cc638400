use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// Trim and lower-case a user supplied answer or option.
pub fn normalize_answer(value: &str) -> String {
    value.trim().to_lowercase()
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(
            ValidationError::new("blank").with_message(Cow::Borrowed("should not be empty"))
        );
    }
    Ok(())
}

/// Body of `POST /api/quiz/{id}/response`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(
        required(message = "should be included in the body"),
        custom(function = "not_blank")
    )]
    pub question_id: Option<String>,

    #[validate(
        required(message = "should be included in the body"),
        custom(function = "not_blank")
    )]
    pub choice: Option<String>,
}

/// A validated, normalized answer submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSubmission {
    pub question_id: String,
    pub choice: String,
}

impl SubmitAnswerRequest {
    const FIELDS: [&'static str; 2] = ["question_id", "choice"];

    /// Parse a raw JSON body. Every missing or empty field is reported, not
    /// only the first one.
    pub fn parse(body: &[u8]) -> Result<AnswerSubmission, Vec<String>> {
        let request: SubmitAnswerRequest =
            serde_json::from_slice(body).map_err(|_| vec!["JSON is invalid".to_string()])?;
        request.into_submission()
    }

    pub fn into_submission(self) -> Result<AnswerSubmission, Vec<String>> {
        if let Err(errors) = self.validate() {
            let field_errors = errors.field_errors();
            let mut messages = Vec::new();
            for field in Self::FIELDS {
                if let Some(errs) = field_errors.get(field) {
                    for err in errs.iter() {
                        let message = err.message.as_deref().unwrap_or("is invalid");
                        messages.push(format!("{} {}", field, message));
                    }
                }
            }
            return Err(messages);
        }

        Ok(AnswerSubmission {
            question_id: normalize_answer(self.question_id.as_deref().unwrap_or_default()),
            choice: normalize_answer(self.choice.as_deref().unwrap_or_default()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerResult {
    Right,
    Wrong,
}

impl AnswerResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerResult::Right => "Right",
            AnswerResult::Wrong => "Wrong",
        }
    }
}

/// One recorded answer inside a quiz document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub question_id: ObjectId,
    pub response: String,
    pub result: AnswerResult,
    pub correct_answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponseView {
    pub question_id: String,
    pub response: String,
    pub result: AnswerResult,
    pub correct_answer: String,
}

impl From<&UserResponse> for UserResponseView {
    fn from(response: &UserResponse) -> Self {
        UserResponseView {
            question_id: response.question_id.to_hex(),
            response: response.response.clone(),
            result: response.result,
            correct_answer: response.correct_answer.clone(),
        }
    }
}
