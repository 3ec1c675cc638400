use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, to_bson, Document},
    options::IndexOptions,
    Collection, Database, IndexModel,
};

use super::{QuestionStore, QuizStore, TopicStore, UserStore};
use crate::metrics::track_db_operation;
use crate::models::{Question, Quiz, User, UserResponse};

const QUESTIONS: &str = "questions";
const QUIZZES: &str = "quizzes";
const USERS: &str = "users";
const TOPICS: &str = "topics";

pub struct MongoStore {
    mongo: Database,
}

impl MongoStore {
    /// Ping the server and make sure the indexes the gateway relies on exist.
    pub async fn connect(mongo: Database) -> Result<Self> {
        mongo
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;

        let store = Self { mongo };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<()> {
        let text_index = IndexModel::builder()
            .keys(doc! { "topic": "text", "question": "text" })
            .options(
                IndexOptions::builder()
                    .name("questions_text".to_string())
                    .build(),
            )
            .build();
        if let Err(e) = self.questions().create_index(text_index).await {
            // Only one text index is allowed per collection; an existing one still serves $text.
            tracing::warn!("Could not create questions text index: {}", e);
        }

        let unique = IndexOptions::builder().unique(true).build();
        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await
            .context("Failed to create users.username index")?;
        self.topics()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "topic": 1 })
                    .options(unique)
                    .build(),
            )
            .await
            .context("Failed to create topics.topic index")?;

        tracing::info!("MongoDB indexes ensured");
        Ok(())
    }

    fn questions(&self) -> Collection<Question> {
        self.mongo.collection(QUESTIONS)
    }

    fn quizzes(&self) -> Collection<Quiz> {
        self.mongo.collection(QUIZZES)
    }

    fn users(&self) -> Collection<User> {
        self.mongo.collection(USERS)
    }

    fn topics(&self) -> Collection<Document> {
        self.mongo.collection(TOPICS)
    }
}

#[async_trait]
impl QuestionStore for MongoStore {
    async fn search_by_topic(&self, topic: &str) -> Result<Vec<Question>> {
        track_db_operation("find", QUESTIONS, async {
            let cursor = self
                .questions()
                .find(doc! { "$text": { "$search": topic } })
                .await
                .context("Failed to search questions")?;
            cursor
                .try_collect()
                .await
                .context("Failed to collect question documents")
        })
        .await
    }

    async fn insert_many(&self, questions: &[Question]) -> Result<usize> {
        if questions.is_empty() {
            return Ok(0);
        }
        track_db_operation("insert_many", QUESTIONS, async {
            let result = self
                .questions()
                .insert_many(questions)
                .await
                .context("Failed to insert questions")?;
            Ok(result.inserted_ids.len())
        })
        .await
    }
}

#[async_trait]
impl QuizStore for MongoStore {
    async fn insert(&self, quiz: &Quiz) -> Result<ObjectId> {
        track_db_operation("insert_one", QUIZZES, async {
            let result = self
                .quizzes()
                .insert_one(quiz)
                .await
                .context("Failed to insert quiz")?;
            result
                .inserted_id
                .as_object_id()
                .ok_or_else(|| anyhow!("Failed to get inserted quiz ID"))
        })
        .await
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Quiz>> {
        track_db_operation("find_one", QUIZZES, async {
            self.quizzes()
                .find_one(doc! { "_id": id })
                .await
                .context("Failed to fetch quiz")
        })
        .await
    }

    async fn mark_completed(&self, id: &ObjectId) -> Result<()> {
        track_db_operation("update_one", QUIZZES, async {
            let result = self
                .quizzes()
                .update_one(doc! { "_id": id }, doc! { "$set": { "completed": true } })
                .await
                .context("Failed to mark quiz completed")?;
            if result.matched_count == 0 {
                return Err(anyhow!("Quiz {} vanished before update", id));
            }
            Ok(())
        })
        .await
    }

    async fn save_progress(
        &self,
        id: &ObjectId,
        responses: &[UserResponse],
        completed: bool,
    ) -> Result<()> {
        track_db_operation("update_one", QUIZZES, async {
            let responses = to_bson(responses).context("Failed to encode user responses")?;
            let result = self
                .quizzes()
                .update_one(
                    doc! { "_id": id },
                    doc! { "$set": {
                        "user_responses": responses,
                        "completed": completed,
                    } },
                )
                .await
                .context("Failed to save quiz progress")?;
            if result.matched_count == 0 {
                return Err(anyhow!("Quiz {} vanished before update", id));
            }
            Ok(())
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.mongo
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        track_db_operation("find_one", USERS, async {
            self.users()
                .find_one(doc! { "username": username })
                .await
                .context("Failed to fetch user")
        })
        .await
    }

    async fn insert(&self, user: &User) -> Result<ObjectId> {
        track_db_operation("insert_one", USERS, async {
            let result = self
                .users()
                .insert_one(user)
                .await
                .context("Failed to insert user")?;
            result
                .inserted_id
                .as_object_id()
                .ok_or_else(|| anyhow!("Failed to get inserted user ID"))
        })
        .await
    }
}

#[async_trait]
impl TopicStore for MongoStore {
    async fn upsert(&self, topic: &str) -> Result<()> {
        track_db_operation("update_one", TOPICS, async {
            self.topics()
                .update_one(
                    doc! { "topic": topic },
                    doc! { "$setOnInsert": { "topic": topic } },
                )
                .upsert(true)
                .await
                .context("Failed to upsert topic")?;
            Ok(())
        })
        .await
    }

    async fn list(&self) -> Result<Vec<String>> {
        track_db_operation("find", TOPICS, async {
            let cursor = self
                .topics()
                .find(doc! {})
                .sort(doc! { "topic": 1 })
                .await
                .context("Failed to list topics")?;
            let docs: Vec<Document> = cursor
                .try_collect()
                .await
                .context("Failed to collect topic documents")?;
            Ok(docs
                .iter()
                .filter_map(|d| d.get_str("topic").ok().map(str::to_string))
                .collect())
        })
        .await
    }
}
