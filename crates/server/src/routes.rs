use std::path::Path;

use axum::Router;
use tower_http::services::ServeDir;

use crate::bootstrap::Application;
use crate::chat::{self, ChatState};
use crate::health::{self, HealthState};

/// Full HTTP surface: chat API, health, and the static chat page as fallback.
pub fn app_router(app: &Application) -> Router {
    build(
        ChatState::new(app.orchestrator.clone(), app.recorder.clone()),
        HealthState::new(app.db_pool.clone(), app.catalog.len(), app.orchestrator.clone()),
        &app.config.server.static_dir,
    )
}

pub fn build(chat_state: ChatState, health_state: HealthState, static_dir: &Path) -> Router {
    Router::new()
        .merge(chat::router(chat_state))
        .merge(health::router(health_state))
        .fallback_service(ServeDir::new(static_dir))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use shopdesk_agent::{
        ChatOrchestrator, ChatRequest, GenerationParams, LlmClient, LlmError, LlmGateway,
    };
    use shopdesk_core::prompt::render;
    use shopdesk_db::{connect_with_settings, InMemoryChatTurnRepository};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::build;
    use crate::chat::ChatState;
    use crate::health::HealthState;

    struct FixedClient;

    #[async_trait]
    impl LlmClient for FixedClient {
        async fn complete(&self, _request: &ChatRequest) -> Result<String, LlmError> {
            Ok("Laptop X стоит 999 руб.".to_string())
        }
    }

    async fn router(static_dir: &std::path::Path) -> axum::Router {
        let gateway = LlmGateway::with_client(
            "gpt://b1gfolder/yandexgpt-lite",
            GenerationParams::default(),
            Arc::new(FixedClient),
        );
        let orchestrator = Arc::new(ChatOrchestrator::new(Arc::new(gateway), render("Rules", &[])));
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool");

        build(
            ChatState::new(orchestrator.clone(), Arc::new(InMemoryChatTurnRepository::default())),
            HealthState::new(pool, 1, orchestrator),
            static_dir,
        )
    }

    fn post_chat(body: &str) -> Request<Body> {
        Request::post("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn chat_round_trip_through_router() {
        let dir = TempDir::new().expect("tempdir");
        let app = router(dir.path()).await;

        let response = app
            .oneshot(post_chat(r#"{"message":"Сколько стоит Laptop X?"}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["reply"], "Laptop X стоит 999 руб.");
    }

    #[tokio::test]
    async fn missing_message_field_is_bad_request() {
        let dir = TempDir::new().expect("tempdir");
        let app = router(dir.path()).await;

        let response = app.oneshot(post_chat("{}")).await.expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn index_page_is_served_from_static_dir() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("index.html"), "<html>chat</html>").expect("write index");
        let app = router(dir.path()).await;

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&body[..], b"<html>chat</html>");
    }

    #[tokio::test]
    async fn health_route_is_mounted() {
        let dir = TempDir::new().expect("tempdir");
        let app = router(dir.path()).await;

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }
}
