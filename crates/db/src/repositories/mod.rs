use async_trait::async_trait;
use thiserror::Error;

use mailbot_core::domain::record::{ChatUserId, UserRecord};

pub mod memory;
pub mod user_record;

pub use memory::InMemoryUserRecordRepository;
pub use user_record::SqlUserRecordRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Durable chat-identity → email mapping. Single-key atomicity only; the
/// engine reconciles staleness against the directory, so the store never
/// needs cross-key transactions.
#[async_trait]
pub trait UserRecordRepository: Send + Sync {
    async fn find_by_id(&self, id: &ChatUserId) -> Result<Option<UserRecord>, RepositoryError>;
    async fn save(&self, record: UserRecord) -> Result<(), RepositoryError>;
    async fn delete(&self, id: &ChatUserId) -> Result<(), RepositoryError>;
}
