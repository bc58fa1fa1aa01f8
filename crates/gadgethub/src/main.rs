use anyhow::{Context, Result};
use dotenv::dotenv;
use gadgethub::{handler::AppRouter, state::AppState};
use shared::{
    config::{Config, ConnectionManager},
    utils::{Telemetry, init_logger},
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = Config::init().context("Failed to load configuration")?;

    let mut telemetry = Telemetry::new("gadgethub", config.otel_endpoint.clone());

    let logger_provider = telemetry
        .init_logger()
        .context("Failed to initialize OTLP logger")?;
    telemetry
        .init_meter()
        .context("Failed to initialize OTLP meter")?;
    telemetry
        .init_tracer()
        .context("Failed to initialize OTLP tracer")?;

    let _log_guard =
        init_logger(&logger_provider, "gadgethub").context("Failed to install logger")?;

    let pool = ConnectionManager::new_pool(
        &config.database_url,
        config.db_max_connection,
        config.db_min_connection,
    )
    .await
    .context("Failed to connect to database")?;

    if config.run_migrations {
        info!("🗄️ Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
    }

    let state = AppState::new(pool, &config)
        .await
        .context("Failed to create AppState")?;

    info!("🚀 GadgetHub starting on port {}", config.port);

    AppRouter::serve(config.port, state)
        .await
        .context("Failed to start server")?;

    info!("Shutting down...");

    telemetry.shutdown().await?;

    Ok(())
}
