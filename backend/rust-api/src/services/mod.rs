use crate::config::{Config, StorageBackend};
use crate::utils::keyed_lock::KeyedLocks;
use mongodb::bson::oid::ObjectId;
use mongodb::Client as MongoClient;
use std::sync::Arc;

use store::{memory::MemoryStore, mongo::MongoStore, QuestionStore, QuizStore, TopicStore, UserStore};

pub struct AppState {
    pub config: Config,
    pub questions: Arc<dyn QuestionStore>,
    pub quizzes: Arc<dyn QuizStore>,
    pub users: Arc<dyn UserStore>,
    pub topics: Arc<dyn TopicStore>,
    pub quiz_locks: Arc<KeyedLocks<ObjectId>>,
}

impl AppState {
    /// Connect the configured persistence backend and seed the admin account.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let state = match config.storage_backend {
            StorageBackend::Mongo => {
                let client = MongoClient::with_uri_str(&config.mongo_uri).await?;
                let store = MongoStore::connect(client.database(&config.mongo_database)).await?;
                tracing::info!("MongoDB connected");
                Self::with_store(config, Arc::new(store))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage, data is lost on restart");
                Self::with_store(config, Arc::new(MemoryStore::new()))
            }
        };

        if let Some(seed) = &state.config.admin_seed {
            superuser_seed::bootstrap(seed, state.users.as_ref()).await?;
        }

        Ok(state)
    }

    /// Build state around a single store implementing every gateway.
    pub fn with_store<S>(config: Config, store: Arc<S>) -> Self
    where
        S: QuestionStore + QuizStore + UserStore + TopicStore + 'static,
    {
        Self {
            config,
            questions: store.clone(),
            quizzes: store.clone(),
            users: store.clone(),
            topics: store,
            quiz_locks: Arc::new(KeyedLocks::new()),
        }
    }
}

/// Caller-facing failure kinds shared by every service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("invalid request body: {}", .0.join(", "))]
    InvalidFields(Vec<String>),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ServiceError::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        ServiceError::InvalidState(message.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Parse a hex object id, reporting the offending field on failure.
pub fn parse_object_id(value: &str, what: &str) -> ServiceResult<ObjectId> {
    ObjectId::parse_str(value.trim())
        .map_err(|_| ServiceError::invalid_input(format!("{} is in the wrong format", what)))
}

pub mod answer_service;
pub mod auth_service;
pub mod question_service;
pub mod quiz_service;
pub mod result_service;
pub mod store;
pub mod superuser_seed;
