use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::answer::normalize_answer;

/// Question stored in MongoDB "questions" collection.
///
/// Quizzes embed a copy of every question they were generated from, so the
/// same shape is used for both the question bank and the quiz snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub topic: String,
    #[serde(rename = "question")]
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub distractors: Vec<String>,
}

impl Question {
    /// Case-insensitive membership test of an already normalized choice.
    pub fn accepts_choice(&self, choice: &str) -> bool {
        self.options
            .iter()
            .any(|option| normalize_answer(option) == choice)
    }

    pub fn normalized_correct_answer(&self) -> String {
        normalize_answer(&self.correct_answer)
    }
}

/// One entry of an uploaded questions file.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionUpload {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub distractors: Option<Vec<String>>,
}

impl QuestionUpload {
    pub fn into_question(self, topic: &str) -> Question {
        Question {
            id: ObjectId::new(),
            topic: topic.to_string(),
            prompt: self.question,
            options: self.options,
            correct_answer: self.correct_answer,
            distractors: self.distractors.unwrap_or_default(),
        }
    }
}

/// Question as shown to a quiz taker: no answer key, no distractors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        QuestionView {
            id: question.id.to_hex(),
            question: question.prompt.clone(),
            options: question.options.clone(),
        }
    }
}

/// Question as shown to administrators browsing the bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDetail {
    pub id: String,
    pub topic: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub distractors: Vec<String>,
}

impl From<Question> for QuestionDetail {
    fn from(question: Question) -> Self {
        QuestionDetail {
            id: question.id.to_hex(),
            topic: question.topic,
            question: question.prompt,
            options: question.options,
            correct_answer: question.correct_answer,
            distractors: question.distractors,
        }
    }
}
