//! Persistence gateway.
//!
//! Services only see these traits; `mongo::MongoStore` is the production
//! backend and `memory::MemoryStore` backs tests and `STORAGE_BACKEND=memory`.

use anyhow::Result;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::models::{Question, Quiz, User, UserResponse};

pub mod memory;
pub mod mongo;

#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Full-text search over question topic and prompt, in store order.
    async fn search_by_topic(&self, topic: &str) -> Result<Vec<Question>>;

    async fn insert_many(&self, questions: &[Question]) -> Result<usize>;
}

#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Insert a new quiz and return its generated identifier.
    async fn insert(&self, quiz: &Quiz) -> Result<ObjectId>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Quiz>>;

    /// Set `completed = true` without touching anything else.
    async fn mark_completed(&self, id: &ObjectId) -> Result<()>;

    /// Overwrite `user_responses` and `completed` in one partial update.
    async fn save_progress(
        &self,
        id: &ObjectId,
        responses: &[UserResponse],
        completed: bool,
    ) -> Result<()>;

    async fn ping(&self) -> Result<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn insert(&self, user: &User) -> Result<ObjectId>;
}

#[async_trait]
pub trait TopicStore: Send + Sync {
    /// Record a topic name; repeated names are stored once.
    async fn upsert(&self, topic: &str) -> Result<()>;

    async fn list(&self) -> Result<Vec<String>>;
}
