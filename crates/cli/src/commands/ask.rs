use std::sync::Arc;

use shopdesk_agent::{ChatOrchestrator, LlmGateway};

use crate::commands::{compile_system_prompt, load_config, runtime, CommandResult, StepFailure};

/// One-shot turn through the configured backend. Nothing is recorded.
pub fn run(message: &str) -> CommandResult {
    if message.trim().is_empty() {
        return CommandResult::failure("ask", "invalid_input", "message must not be empty", 2);
    }

    let config = match load_config("ask") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("ask") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let prompt = compile_system_prompt(&config).await?;
        let gateway = LlmGateway::initialize(&config.llm)
            .map_err(|error| ("config_validation", error.to_string(), 2u8))?;
        let orchestrator = ChatOrchestrator::new(Arc::new(gateway), prompt);
        Ok::<_, StepFailure>(orchestrator.respond_detailed(message).await)
    });

    match result {
        Ok(reply) if reply.is_answer() => CommandResult::success("ask", reply.into_text()),
        Ok(reply) => CommandResult::failure("ask", "llm_exchange", reply.into_text(), 6),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("ask", error_class, message, exit_code)
        }
    }
}
