use crate::commands::{load_config, runtime, CommandResult, StepFailure};
use shopdesk_db::{connect_with_settings, migrations, DemoCatalog, SeedResult};

/// Seeds the catalog store, which is the application database unless
/// `catalog.database_url` points elsewhere.
pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let catalog_url = config.catalog.effective_url(&config.database).to_string();
    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &catalog_url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seeded: Result<SeedResult, StepFailure> = DemoCatalog::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8));

        pool.close().await;
        seeded
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", seed_message(&seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn seed_message(seeded: &SeedResult) -> String {
    format!(
        "demo catalog loaded: {} products written, {} products in catalog",
        seeded.products_seeded, seeded.catalog_total
    )
}
