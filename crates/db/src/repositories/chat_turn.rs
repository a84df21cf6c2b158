use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use shopdesk_core::domain::chat::{ChatTurn, ChatTurnId, NewChatTurn};

use super::{ChatTurnRepository, RepositoryError};
use crate::DbPool;

pub struct SqlChatTurnRepository {
    pool: DbPool,
}

impl SqlChatTurnRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ChatTurnRepository for SqlChatTurnRepository {
    async fn append(&self, turn: NewChatTurn) -> Result<ChatTurn, RepositoryError> {
        let row = sqlx::query(
            "INSERT INTO chat_turn (user_message, llm_reply) VALUES (?, ?)
             RETURNING id, user_message, llm_reply, created_at",
        )
        .bind(turn.user_message())
        .bind(turn.llm_reply())
        .fetch_one(&self.pool)
        .await?;

        decode_turn(&row)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<ChatTurn>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_message, llm_reply, created_at
             FROM chat_turn
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_turn).collect()
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chat_turn").fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }
}

fn decode_turn(row: &SqliteRow) -> Result<ChatTurn, RepositoryError> {
    let created_at: String = row.try_get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| {
            RepositoryError::Decode(format!("invalid chat_turn.created_at `{created_at}`: {error}"))
        })?;

    Ok(ChatTurn {
        id: ChatTurnId(row.try_get("id")?),
        user_message: row.try_get("user_message")?,
        llm_reply: row.try_get("llm_reply")?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use shopdesk_core::domain::chat::NewChatTurn;

    use super::SqlChatTurnRepository;
    use crate::repositories::{ChatTurnRepository, RepositoryError};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn append_assigns_increasing_ids_and_timestamps() {
        let pool = setup().await;
        let repo = SqlChatTurnRepository::new(pool.clone());

        let first = repo
            .append(NewChatTurn::new("Есть ноутбуки?", "Да, Laptop X.").expect("turn"))
            .await
            .expect("append first");
        let second = repo
            .append(
                NewChatTurn::new("А гарантия?", "Произошла ошибка: backend returned 500")
                    .expect("turn"),
            )
            .await
            .expect("append second");

        assert!(second.id > first.id, "ids must increase monotonically");
        assert!(second.created_at >= first.created_at);
        assert_eq!(second.llm_reply, "Произошла ошибка: backend returned 500");
        assert_eq!(repo.count().await.expect("count"), 2);

        pool.close().await;
    }

    #[tokio::test]
    async fn list_recent_returns_newest_first_and_honours_limit() {
        let pool = setup().await;
        let repo = SqlChatTurnRepository::new(pool.clone());

        for index in 0..5 {
            repo.append(NewChatTurn::new(format!("q{index}"), format!("a{index}")).expect("turn"))
                .await
                .expect("append");
        }

        let recent = repo.list_recent(3).await.expect("list");
        let messages: Vec<_> = recent.iter().map(|turn| turn.user_message.as_str()).collect();
        assert_eq!(messages, ["q4", "q3", "q2"]);

        pool.close().await;
    }
}
