use std::process::ExitCode;

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    shopdesk_cli::run()
}
