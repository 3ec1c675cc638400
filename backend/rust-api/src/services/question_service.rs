use serde::Serialize;
use std::sync::Arc;

use super::{
    store::{QuestionStore, TopicStore},
    ServiceError, ServiceResult,
};
use crate::models::{QuestionDetail, QuestionUpload};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UploadSummary {
    pub number_of_questions_inserted: usize,
    pub topic: String,
}

pub struct QuestionService {
    questions: Arc<dyn QuestionStore>,
    topics: Arc<dyn TopicStore>,
}

impl QuestionService {
    pub fn new(questions: Arc<dyn QuestionStore>, topics: Arc<dyn TopicStore>) -> Self {
        Self { questions, topics }
    }

    /// Ingest a JSON array of questions under `topic`.
    pub async fn upload_questions(
        &self,
        topic: Option<&str>,
        file: Option<&[u8]>,
    ) -> ServiceResult<UploadSummary> {
        let topic = topic.map(str::trim).unwrap_or_default();
        if topic.is_empty() {
            return Err(ServiceError::invalid_input("Topic not provided"));
        }
        let file = file.ok_or_else(|| ServiceError::invalid_input("Questions file not provided"))?;

        let uploads: Vec<QuestionUpload> = serde_json::from_slice(file).map_err(|e| {
            tracing::warn!("Rejected questions file for topic '{}': {}", topic, e);
            ServiceError::invalid_input("Invalid JSON file. Please upload valid JSON")
        })?;
        if uploads.is_empty() {
            return Err(ServiceError::invalid_input("Questions file has no questions"));
        }

        let questions: Vec<_> = uploads
            .into_iter()
            .map(|upload| upload.into_question(topic))
            .collect();

        let inserted = self.questions.insert_many(&questions).await?;
        self.topics.upsert(topic).await?;

        tracing::info!("Inserted {} questions for topic '{}'", inserted, topic);

        Ok(UploadSummary {
            number_of_questions_inserted: inserted,
            topic: topic.to_string(),
        })
    }

    pub async fn list_by_topic(&self, topic: Option<&str>) -> ServiceResult<Vec<QuestionDetail>> {
        let topic = topic.map(str::trim).unwrap_or_default();
        if topic.is_empty() {
            return Err(ServiceError::invalid_input("Topic not provided in URL"));
        }

        let questions = self.questions.search_by_topic(topic).await?;
        if questions.is_empty() {
            return Err(ServiceError::not_found("No questions found with this topic"));
        }

        Ok(questions.into_iter().map(QuestionDetail::from).collect())
    }

    pub async fn list_topics(&self) -> ServiceResult<Vec<String>> {
        Ok(self.topics.list().await?)
    }
}
