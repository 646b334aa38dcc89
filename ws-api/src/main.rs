use anyhow::Result;
use tracing::info;
use ws_api::{create_app, logging, Config};
use ws_orchestrator::db::{backup_database, create_pool, run_migrations};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    info!("Starting ws-api service...");

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        db_path = %config.db_path.display(),
        "Configuration loaded"
    );

    let db_path = &config.db_path;
    if db_path.exists() {
        let backup_path = backup_database(db_path)?;
        info!("Database backed up to: {}", backup_path.display());
    }

    let pool = create_pool(db_path).await?;
    info!("Running database migrations...");
    run_migrations(&pool).await?;
    info!("Migrations complete");

    let app = create_app(pool, config.settings).await?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
