use std::sync::Arc;

use shopdesk_core::prompt::SystemPrompt;

use crate::gateway::{ChatReply, LlmGateway};

/// Handles one chat turn: user message in, display text out.
///
/// Holds the compiled system prompt and a shared gateway. No state is carried
/// between turns, so concurrent turns are independent.
#[derive(Clone)]
pub struct ChatOrchestrator {
    gateway: Arc<LlmGateway>,
    system_prompt: SystemPrompt,
}

impl ChatOrchestrator {
    pub fn new(gateway: Arc<LlmGateway>, system_prompt: SystemPrompt) -> Self {
        Self { gateway, system_prompt }
    }

    pub fn system_prompt(&self) -> &SystemPrompt {
        &self.system_prompt
    }

    pub fn gateway(&self) -> &LlmGateway {
        &self.gateway
    }

    /// Always produces a displayable string. Failures come back as
    /// `"Произошла ошибка: ..."` text, never as an error.
    pub async fn respond(&self, user_message: &str) -> String {
        self.respond_detailed(user_message).await.into_text()
    }

    pub async fn respond_detailed(&self, user_message: &str) -> ChatReply {
        self.gateway.exchange(&self.system_prompt, user_message).await
    }
}
