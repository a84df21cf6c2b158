use chrono::Utc;
use tokio::sync::RwLock;

use shopdesk_core::domain::chat::{ChatTurn, ChatTurnId, NewChatTurn};

use super::{ChatTurnRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryChatTurnRepository {
    turns: RwLock<Vec<ChatTurn>>,
}

impl InMemoryChatTurnRepository {
    pub async fn snapshot(&self) -> Vec<ChatTurn> {
        self.turns.read().await.clone()
    }
}

#[async_trait::async_trait]
impl ChatTurnRepository for InMemoryChatTurnRepository {
    async fn append(&self, turn: NewChatTurn) -> Result<ChatTurn, RepositoryError> {
        let (user_message, llm_reply) = turn.into_parts();
        let mut turns = self.turns.write().await;
        let next_id = turns.last().map(|last| last.id.0 + 1).unwrap_or(1);
        let stored = ChatTurn {
            id: ChatTurnId(next_id),
            user_message,
            llm_reply,
            created_at: Utc::now(),
        };
        turns.push(stored.clone());
        Ok(stored)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<ChatTurn>, RepositoryError> {
        let turns = self.turns.read().await;
        Ok(turns.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.turns.read().await.len() as u64)
    }
}
