//! Chat endpoints.
//!
//! - `POST /chat`     `{ "message": "..." }` -> `{ "reply": "..." }`
//! - `GET  /history`  recent turns, newest first (`?limit=N`, default 20, max 200)

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shopdesk_agent::ChatOrchestrator;
use shopdesk_core::domain::chat::{ChatTurn, NewChatTurn};
use shopdesk_core::errors::{ApplicationError, InterfaceError};
use shopdesk_db::ChatTurnRepository;
use tracing::{error, info, warn};
use uuid::Uuid;

const DEFAULT_HISTORY_LIMIT: u32 = 20;
const MAX_HISTORY_LIMIT: u32 = 200;

#[derive(Clone)]
pub struct ChatState {
    orchestrator: Arc<ChatOrchestrator>,
    recorder: Arc<dyn ChatTurnRepository>,
}

impl ChatState {
    pub fn new(orchestrator: Arc<ChatOrchestrator>, recorder: Arc<dyn ChatTurnRepository>) -> Self {
        Self { orchestrator, recorder }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub turns: Vec<ChatTurn>,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub correlation_id: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub fn router(state: ChatState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/history", get(history))
        .with_state(state)
}

pub async fn chat(
    State(state): State<ChatState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();

    let turn = NewChatTurn::new(request.message, String::new()).map_err(|violation| {
        warn!(
            event_name = "chat.turn.rejected",
            correlation_id = %correlation_id,
            reason = %violation,
            "chat message rejected"
        );
        reject(ApplicationError::from(violation).into_interface(&correlation_id))
    })?;

    info!(
        event_name = "chat.turn.received",
        correlation_id = %correlation_id,
        message_chars = turn.user_message().chars().count(),
        "chat turn received"
    );

    let outcome = state.orchestrator.respond_detailed(turn.user_message()).await;
    let answered = outcome.is_answer();
    let reply = outcome.into_text();

    match state.recorder.append(turn.with_reply(reply.clone())).await {
        Ok(stored) => info!(
            event_name = "chat.turn.completed",
            correlation_id = %correlation_id,
            turn_id = stored.id.0,
            answered,
            "chat turn completed"
        ),
        Err(persist_error) => error!(
            event_name = "chat.turn.persist_failed",
            correlation_id = %correlation_id,
            answered,
            error = %persist_error,
            "chat turn could not be recorded; reply is still returned"
        ),
    }

    Ok(Json(ChatResponse { reply }))
}

pub async fn history(
    State(state): State<ChatState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);

    let persistence = |error: shopdesk_db::RepositoryError| {
        error!(
            event_name = "chat.history.failed",
            correlation_id = %correlation_id,
            error = %error,
            "chat history query failed"
        );
        reject(ApplicationError::Persistence(error.to_string()).into_interface(&correlation_id))
    };

    let turns = state.recorder.list_recent(limit).await.map_err(persistence)?;
    let total = state.recorder.count().await.map_err(persistence)?;

    Ok(Json(HistoryResponse { turns, total }))
}

fn reject(error: InterfaceError) -> ApiError {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ErrorBody {
        error: error.user_message().to_string(),
        correlation_id: error.correlation_id().to_string(),
    };
    (status, Json(body))
}
