use anyhow::{anyhow, Result};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{QuestionStore, QuizStore, TopicStore, UserStore};
use crate::models::{Question, Quiz, User, UserResponse};

#[derive(Default)]
struct Collections {
    questions: Vec<Question>,
    quizzes: Vec<Quiz>,
    users: Vec<User>,
    topics: Vec<String>,
}

/// In-process store with the same observable behavior as `MongoStore`.
///
/// Topic search approximates a text index: the query and the indexed fields
/// are split into lower-cased words and any shared word is a match.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<Collections>,
    failing: AtomicBool,
    failing_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail, simulating an unavailable store.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make quiz updates fail while reads keep working.
    pub fn set_failing_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    /// Insert a quiz as-is, keeping its id when present. Test fixture helper.
    pub fn put_quiz(&self, mut quiz: Quiz) -> ObjectId {
        let id = quiz.id.unwrap_or_else(ObjectId::new);
        quiz.id = Some(id);
        let mut data = self.lock();
        data.quizzes.retain(|q| q.id != Some(id));
        data.quizzes.push(quiz);
        id
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("in-memory store is unavailable"));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        self.check()?;
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("in-memory store rejected the write"));
        }
        Ok(())
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

fn text_matches(question: &Question, query: &[String]) -> bool {
    words(&question.topic)
        .chain(words(&question.prompt))
        .any(|w| query.contains(&w))
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn search_by_topic(&self, topic: &str) -> Result<Vec<Question>> {
        self.check()?;
        let query: Vec<String> = words(topic).collect();
        Ok(self
            .lock()
            .questions
            .iter()
            .filter(|q| text_matches(q, &query))
            .cloned()
            .collect())
    }

    async fn insert_many(&self, questions: &[Question]) -> Result<usize> {
        self.check()?;
        self.lock().questions.extend_from_slice(questions);
        Ok(questions.len())
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn insert(&self, quiz: &Quiz) -> Result<ObjectId> {
        self.check()?;
        let id = ObjectId::new();
        let mut stored = quiz.clone();
        stored.id = Some(id);
        self.lock().quizzes.push(stored);
        Ok(id)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Quiz>> {
        self.check()?;
        Ok(self
            .lock()
            .quizzes
            .iter()
            .find(|q| q.id.as_ref() == Some(id))
            .cloned())
    }

    async fn mark_completed(&self, id: &ObjectId) -> Result<()> {
        self.check_write()?;
        let mut data = self.lock();
        let quiz = data
            .quizzes
            .iter_mut()
            .find(|q| q.id.as_ref() == Some(id))
            .ok_or_else(|| anyhow!("Quiz {} vanished before update", id))?;
        quiz.completed = true;
        Ok(())
    }

    async fn save_progress(
        &self,
        id: &ObjectId,
        responses: &[UserResponse],
        completed: bool,
    ) -> Result<()> {
        self.check_write()?;
        let mut data = self.lock();
        let quiz = data
            .quizzes
            .iter_mut()
            .find(|q| q.id.as_ref() == Some(id))
            .ok_or_else(|| anyhow!("Quiz {} vanished before update", id))?;
        quiz.user_responses = responses.to_vec();
        quiz.completed = completed;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.check()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.check()?;
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert(&self, user: &User) -> Result<ObjectId> {
        self.check()?;
        let mut data = self.lock();
        if data.users.iter().any(|u| u.username == user.username) {
            return Err(anyhow!("duplicate username {}", user.username));
        }
        let id = ObjectId::new();
        let mut stored = user.clone();
        stored.id = Some(id);
        data.users.push(stored);
        Ok(id)
    }
}

#[async_trait]
impl TopicStore for MemoryStore {
    async fn upsert(&self, topic: &str) -> Result<()> {
        self.check()?;
        let mut data = self.lock();
        if !data.topics.iter().any(|t| t == topic) {
            data.topics.push(topic.to_string());
            data.topics.sort();
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        self.check()?;
        Ok(self.lock().topics.clone())
    }
}
