use std::sync::Arc;

use shopdesk_agent::{ChatOrchestrator, LlmGateway};
use shopdesk_core::catalog::{load_snapshot, CatalogSnapshot, CatalogSource};
use shopdesk_core::config::{AppConfig, ConfigError, LoadOptions};
use shopdesk_core::prompt::{compile, FileInstructions, PromptError};
use shopdesk_db::{
    connect_with_settings, migrations, ChatTurnRepository, DbPool, SqlCatalogSource,
    SqlChatTurnRepository,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub catalog: CatalogSnapshot,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub recorder: Arc<dyn ChatTurnRepository>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

/// Startup order: database (fatal), catalog snapshot (degrades to empty),
/// system prompt (fatal), LLM gateway (client failure is soft).
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let catalog_source: Box<dyn CatalogSource> = match &config.catalog.database_url {
        Some(url) => Box::new(SqlCatalogSource::new(url.clone(), config.database.timeout_secs)),
        None => Box::new(SqlCatalogSource::with_pool(db_pool.clone())),
    };
    let catalog = load_snapshot(catalog_source.as_ref()).await;

    let instructions = FileInstructions::new(&config.prompt.instructions_path);
    let system_prompt = compile(&instructions, catalog.products())?;
    info!(
        event_name = "system.bootstrap.prompt_compiled",
        correlation_id = "bootstrap",
        instructions_path = %instructions.path().display(),
        product_count = catalog.len(),
        prompt_bytes = system_prompt.len(),
        "system prompt compiled"
    );

    let gateway = LlmGateway::initialize(&config.llm)?;
    let orchestrator = Arc::new(ChatOrchestrator::new(Arc::new(gateway), system_prompt));
    let recorder: Arc<dyn ChatTurnRepository> =
        Arc::new(SqlChatTurnRepository::new(db_pool.clone()));

    Ok(Application { config, db_pool, catalog, orchestrator, recorder })
}
