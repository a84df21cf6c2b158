use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use shopdesk_agent::ChatOrchestrator;
use shopdesk_db::DbPool;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    catalog_products: usize,
    orchestrator: Arc<ChatOrchestrator>,
}

impl HealthState {
    pub fn new(db_pool: DbPool, catalog_products: usize, orchestrator: Arc<ChatOrchestrator>) -> Self {
        Self { db_pool, catalog_products, orchestrator }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub catalog: HealthCheck,
    pub llm: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// 503 only when the database is unreachable. An empty catalog or an
/// unavailable LLM client reports `degraded` but the service keeps answering.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let catalog = catalog_check(state.catalog_products);
    let llm = llm_check(&state.orchestrator);

    let database_ready = database.status == "ready";
    let all_ready = [&database, &catalog, &llm].iter().all(|check| check.status == "ready");

    let payload = HealthResponse {
        status: if all_ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "shopdesk-server runtime initialized".to_string(),
        },
        database,
        catalog,
        llm,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if database_ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

fn catalog_check(products: usize) -> HealthCheck {
    if products == 0 {
        HealthCheck {
            status: "degraded",
            detail: "catalog snapshot is empty; replies are not grounded".to_string(),
        }
    } else {
        HealthCheck { status: "ready", detail: format!("{products} products in snapshot") }
    }
}

fn llm_check(orchestrator: &ChatOrchestrator) -> HealthCheck {
    let gateway = orchestrator.gateway();
    match gateway.unavailable_reason() {
        None => HealthCheck { status: "ready", detail: format!("model {}", gateway.model_uri()) },
        Some(reason) => {
            HealthCheck { status: "degraded", detail: format!("llm client unavailable: {reason}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use shopdesk_agent::{ChatOrchestrator, GenerationParams, LlmGateway};
    use shopdesk_core::prompt::render;
    use shopdesk_db::connect_with_settings;

    use crate::health::{health, HealthState};

    fn unavailable_orchestrator() -> Arc<ChatOrchestrator> {
        let gateway = LlmGateway::unavailable(
            "gpt://b1gfolder/yandexgpt-lite",
            GenerationParams::default(),
            "invalid header value",
        );
        Arc::new(ChatOrchestrator::new(Arc::new(gateway), render("Rules", &[])))
    }

    #[tokio::test]
    async fn health_is_ok_but_degraded_without_catalog_or_llm_client() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");

        let (status, Json(payload)) =
            health(State(HealthState::new(pool.clone(), 0, unavailable_orchestrator()))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.database.status, "ready");
        assert_eq!(payload.catalog.status, "degraded");
        assert_eq!(payload.llm.status, "degraded");
        assert!(payload.llm.detail.contains("invalid header value"));

        pool.close().await;
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_database_is_unavailable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        pool.close().await;

        let (status, Json(payload)) =
            health(State(HealthState::new(pool, 5, unavailable_orchestrator()))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.database.status, "degraded");
        assert_eq!(payload.catalog.status, "ready");
        assert_eq!(payload.service.status, "ready");
    }
}
