//! Transport to an OpenAI-compatible chat completions endpoint.
//!
//! SECURITY: the API key is only sent to the configured `base_url` and is
//! marked sensitive so it does not show up in header debug output.

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Body of one chat completion call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// HTTP 401/403, usually a wrong or revoked API key.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    /// HTTP 5xx.
    #[error("service error: {0}")]
    ServiceError(String),
    #[error("unexpected response status: {0}")]
    UnexpectedStatus(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The client could not be constructed at startup.
    #[error("LLM client is unavailable: {0}")]
    Unavailable(String),
}

impl LlmError {
    pub fn from_http_status(status: StatusCode, body: &str) -> Self {
        let detail = status_detail(status, body);
        match status.as_u16() {
            401 | 403 => Self::Unauthorized(detail),
            429 => Self::RateLimited(detail),
            400 | 413 | 422 => Self::BadRequest(detail),
            500..=599 => Self::ServiceError(detail),
            _ => Self::UnexpectedStatus(detail),
        }
    }

    pub fn from_transport(error: &reqwest::Error) -> Self {
        let detail = error_chain(error);
        if error.is_timeout() {
            Self::Timeout(detail)
        } else if error.is_decode() {
            Self::MalformedResponse(detail)
        } else {
            Self::Network(detail)
        }
    }
}

/// One request, one reply. Implementations must not retry.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;
}

pub struct HttpLlmClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpLlmClient {
    pub fn new(base_url: &str, api_key: &SecretString, timeout: Duration) -> Result<Self, LlmError> {
        let mut authorization =
            HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret())).map_err(|_| {
                LlmError::Unavailable(
                    "api key contains characters that are not valid in an HTTP header".to_string(),
                )
            })?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|error| LlmError::Unavailable(error_chain(&error)))?;

        Ok(Self { client, endpoint: completions_endpoint(base_url) })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|error| LlmError::from_transport(&error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::from_http_status(status, &body));
        }

        let body = response.text().await.map_err(|error| LlmError::from_transport(&error))?;
        let completion: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|error| LlmError::MalformedResponse(error.to_string()))?;
        completion.into_reply()
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionResponse {
    fn into_reply(self) -> Result<String, LlmError> {
        let choice = self.choices.into_iter().next().ok_or_else(|| {
            LlmError::MalformedResponse("response contained no choices".to_string())
        })?;

        match choice.message.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(LlmError::MalformedResponse(
                "response contained no message content".to_string(),
            )),
        }
    }
}

fn completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn status_detail(status: StatusCode, body: &str) -> String {
    let message = extract_error_message(body).unwrap_or_else(|| body.trim().to_string());
    let message = truncate_chars(&message, MAX_ERROR_BODY_CHARS);
    if message.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {message}")
    }
}

/// Pulls `error.message` (or a string `error`) out of a JSON error body.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(|message| message.as_str())
        .or_else(|| error.as_str())
        .map(str::to_string)
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &value[..index]),
        None => value.to_string(),
    }
}

fn error_chain(error: &dyn StdError) -> String {
    let mut detail = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !detail.contains(&cause_text) {
            detail.push_str(": ");
            detail.push_str(&cause_text);
        }
        source = cause.source();
    }
    detail
}
