use async_trait::async_trait;
use thiserror::Error;

use shopdesk_core::domain::chat::{ChatTurn, NewChatTurn};

pub mod catalog;
pub mod chat_turn;
pub mod memory;

pub use catalog::SqlCatalogSource;
pub use chat_turn::SqlChatTurnRepository;
pub use memory::InMemoryChatTurnRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Append-only store for chat turns.
#[async_trait]
pub trait ChatTurnRepository: Send + Sync {
    /// Writes the turn; the store assigns id and timestamp.
    async fn append(&self, turn: NewChatTurn) -> Result<ChatTurn, RepositoryError>;

    /// Newest turns first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<ChatTurn>, RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;
}
