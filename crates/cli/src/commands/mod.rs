pub mod ask;
pub mod config;
pub mod doctor;
pub mod migrate;
pub mod prompt;
pub mod seed;

use serde::Serialize;
use shopdesk_core::catalog::load_snapshot;
use shopdesk_core::config::{AppConfig, LoadOptions};
use shopdesk_core::prompt::{compile, FileInstructions, SystemPrompt};
use shopdesk_db::SqlCatalogSource;
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

/// `(error_class, message, exit_code)` raised inside a command's async block.
type StepFailure = (&'static str, String, u8);

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

fn runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

/// Builds the system prompt the same way the server does at startup.
async fn compile_system_prompt(config: &AppConfig) -> Result<SystemPrompt, StepFailure> {
    let source = SqlCatalogSource::new(
        config.catalog.effective_url(&config.database),
        config.database.timeout_secs,
    );
    let catalog = load_snapshot(&source).await;
    let instructions = FileInstructions::new(&config.prompt.instructions_path);
    let prompt = compile(&instructions, catalog.products())
        .map_err(|error| ("prompt_compile", error.to_string(), 4u8))?;
    Ok(prompt)
}
