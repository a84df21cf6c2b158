pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "shopdesk",
    about = "Shopdesk operator CLI",
    long_about = "Prepare the catalog database, inspect configuration, and exercise the chat pipeline without the web server.",
    after_help = "Examples:\n  shopdesk seed\n  shopdesk doctor --json\n  shopdesk ask \"Есть ли ноутбук в наличии?\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Migrate the catalog database and load the demo product catalog")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, database, instruction file, catalog and LLM client readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print the compiled system prompt")]
    Prompt,
    #[command(about = "Send one message through the configured LLM backend (not recorded)")]
    Ask {
        #[arg(help = "User message to send")]
        message: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Prompt => commands::prompt::run(),
        Command::Ask { message } => commands::ask::run(&message),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
