use crate::commands::{compile_system_prompt, load_config, runtime, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("prompt") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("prompt") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    match runtime.block_on(compile_system_prompt(&config)) {
        Ok(prompt) => CommandResult::success("prompt", prompt.as_str()),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("prompt", error_class, message, exit_code)
        }
    }
}
