use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatTurnId(pub i64);

/// A persisted user message / model reply pair.
///
/// `llm_reply` may hold an error explanation when the exchange failed; those
/// turns are recorded like any other.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: ChatTurnId,
    pub user_message: String,
    pub llm_reply: String,
    pub created_at: DateTime<Utc>,
}

/// A turn that has not been written yet. Id and timestamp are assigned by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewChatTurn {
    user_message: String,
    llm_reply: String,
}

impl NewChatTurn {
    pub fn new(
        user_message: impl Into<String>,
        llm_reply: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let user_message = user_message.into();
        if user_message.trim().is_empty() {
            return Err(DomainError::InvariantViolation(
                "chat turn user_message must not be empty".to_string(),
            ));
        }

        Ok(Self { user_message, llm_reply: llm_reply.into() })
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn llm_reply(&self) -> &str {
        &self.llm_reply
    }

    /// Replaces the reply once the exchange has finished.
    pub fn with_reply(mut self, llm_reply: impl Into<String>) -> Self {
        self.llm_reply = llm_reply.into();
        self
    }

    pub fn into_parts(self) -> (String, String) {
        (self.user_message, self.llm_reply)
    }
}

#[cfg(test)]
mod tests {
    use super::NewChatTurn;
    use crate::errors::DomainError;

    #[test]
    fn blank_user_message_is_rejected() {
        let result = NewChatTurn::new("   \n", "reply");
        assert!(matches!(result, Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn error_reply_is_a_valid_turn() {
        let turn = NewChatTurn::new("Hello", "Произошла ошибка: timeout").expect("valid turn");
        assert_eq!(turn.llm_reply(), "Произошла ошибка: timeout");
    }

    #[test]
    fn reply_is_filled_in_after_validation() {
        let turn = NewChatTurn::new("Есть ли Laptop X?", "").expect("valid turn");
        let turn = turn.with_reply("Да, 5 шт.");

        assert_eq!(turn.user_message(), "Есть ли Laptop X?");
        assert_eq!(turn.llm_reply(), "Да, 5 шт.");
        assert_eq!(turn.into_parts(), ("Есть ли Laptop X?".to_string(), "Да, 5 шт.".to_string()));
    }
}
