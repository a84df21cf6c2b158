//! Chat turn pipeline for the catalog assistant.
//!
//! - `llm`: transport to the chat completions backend
//! - `gateway`: one request/response exchange per turn, failures turned into text
//! - `runtime`: the orchestrator that pairs the compiled system prompt with a
//!   user message
//!
//! The backend is only ever asked about the current message. There is no
//! conversation memory and no retry.

pub mod gateway;
pub mod llm;
pub mod runtime;

pub use gateway::{ChatReply, GenerationParams, LlmGateway, ERROR_REPLY_PREFIX};
pub use llm::{ChatMessage, ChatRequest, HttpLlmClient, LlmClient, LlmError, Role};
pub use runtime::ChatOrchestrator;
