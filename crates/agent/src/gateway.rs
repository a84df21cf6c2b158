use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use shopdesk_core::config::{ConfigError, LlmConfig};
use shopdesk_core::prompt::SystemPrompt;
use tracing::{error, info, warn};

use crate::llm::{ChatMessage, ChatRequest, HttpLlmClient, LlmClient, LlmError};

/// Prefix of every reply produced from a failed exchange.
pub const ERROR_REPLY_PREFIX: &str = "Произошла ошибка: ";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self { temperature: 1.0, max_tokens: 1024 }
    }
}

/// Outcome of one exchange. Both arms are displayable to the end user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatReply {
    Answer(String),
    Failed(LlmError),
}

impl ChatReply {
    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Answer(_))
    }

    pub fn error(&self) -> Option<&LlmError> {
        match self {
            Self::Answer(_) => None,
            Self::Failed(error) => Some(error),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Answer(text) => text,
            Self::Failed(error) => error_reply(&error),
        }
    }
}

impl fmt::Display for ChatReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Answer(text) => f.write_str(text),
            Self::Failed(error) => f.write_str(&error_reply(error)),
        }
    }
}

fn error_reply(error: &LlmError) -> String {
    let details = error.to_string();
    let details = if details.trim().is_empty() { "unknown error".to_string() } else { details };
    format!("{ERROR_REPLY_PREFIX}{details}")
}

enum ClientState {
    Ready(Arc<dyn LlmClient>),
    Unavailable(String),
}

/// Owns the backend connection settings and performs one exchange per turn.
///
/// A gateway whose client could not be built still exists; each of its
/// exchanges fails with [`LlmError::Unavailable`] instead of panicking.
pub struct LlmGateway {
    model_uri: String,
    params: GenerationParams,
    client: ClientState,
}

impl LlmGateway {
    /// Validates the credential and folder id (fatal when missing) and builds
    /// the HTTP client (soft failure, logged).
    pub fn initialize(config: &LlmConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .as_ref()
            .filter(|_| config.has_api_key())
            .ok_or_else(|| ConfigError::Validation("llm.api_key is required".to_string()))?;
        let model_uri = config
            .model_uri()
            .ok_or_else(|| ConfigError::Validation("llm.folder_id is required".to_string()))?;
        let params =
            GenerationParams { temperature: config.temperature, max_tokens: config.max_tokens };

        let client = match HttpLlmClient::new(
            &config.base_url,
            api_key,
            Duration::from_secs(config.timeout_secs),
        ) {
            Ok(client) => {
                info!(
                    event_name = "llm.gateway.initialized",
                    correlation_id = "bootstrap",
                    endpoint = %client.endpoint(),
                    model = %model_uri,
                    "llm gateway initialized"
                );
                ClientState::Ready(Arc::new(client))
            }
            Err(error) => {
                error!(
                    event_name = "llm.gateway.client_init_failed",
                    correlation_id = "bootstrap",
                    error = %error,
                    "llm client construction failed; check the API key and its scope. chat replies will report the failure"
                );
                ClientState::Unavailable(error.to_string())
            }
        };

        Ok(Self { model_uri, params, client })
    }

    pub fn with_client(
        model_uri: impl Into<String>,
        params: GenerationParams,
        client: Arc<dyn LlmClient>,
    ) -> Self {
        Self { model_uri: model_uri.into(), params, client: ClientState::Ready(client) }
    }

    pub fn unavailable(
        model_uri: impl Into<String>,
        params: GenerationParams,
        reason: impl Into<String>,
    ) -> Self {
        Self { model_uri: model_uri.into(), params, client: ClientState::Unavailable(reason.into()) }
    }

    pub fn model_uri(&self) -> &str {
        &self.model_uri
    }

    pub fn params(&self) -> GenerationParams {
        self.params
    }

    pub fn is_available(&self) -> bool {
        matches!(self.client, ClientState::Ready(_))
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.client {
            ClientState::Ready(_) => None,
            ClientState::Unavailable(reason) => Some(reason),
        }
    }

    /// Exactly two messages: the system prompt, then the user message.
    pub fn build_request(&self, system_prompt: &SystemPrompt, user_message: &str) -> ChatRequest {
        ChatRequest {
            model: self.model_uri.clone(),
            messages: vec![
                ChatMessage::system(system_prompt.as_str()),
                ChatMessage::user(user_message),
            ],
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        }
    }

    /// Single round trip. Every failure is logged and returned as
    /// [`ChatReply::Failed`]; nothing is retried.
    pub async fn exchange(&self, system_prompt: &SystemPrompt, user_message: &str) -> ChatReply {
        let client = match &self.client {
            ClientState::Ready(client) => client,
            ClientState::Unavailable(reason) => {
                let error = LlmError::Unavailable(reason.clone());
                warn!(
                    event_name = "llm.exchange.skipped",
                    error = %error,
                    "llm exchange skipped because the client is unavailable"
                );
                return ChatReply::Failed(error);
            }
        };

        let request = self.build_request(system_prompt, user_message);
        let started = Instant::now();
        match client.complete(&request).await {
            Ok(reply) => {
                info!(
                    event_name = "llm.exchange.completed",
                    model = %self.model_uri,
                    latency_ms = started.elapsed().as_millis() as u64,
                    reply_chars = reply.chars().count(),
                    "llm exchange completed"
                );
                ChatReply::Answer(reply)
            }
            Err(error) => {
                error!(
                    event_name = "llm.exchange.failed",
                    model = %self.model_uri,
                    latency_ms = started.elapsed().as_millis() as u64,
                    error = %error,
                    "llm exchange failed"
                );
                ChatReply::Failed(error)
            }
        }
    }
}
