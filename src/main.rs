//! VincuHub HTTP service
//!
//! Main application entry point

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use vincuhub::{
    config::Settings,
    database::{connection::{create_pool, run_migrations, DatabaseConfig}, DatabaseService},
    services::{RedisService, ServiceFactory},
    utils::logging,
    web::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate()?;

    // The guard flushes the log file on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", vincuhub::info());

    let database = if settings.database.is_in_memory() {
        warn!("Using the in-memory store; data is lost on shutdown");
        DatabaseService::in_memory()
    } else {
        info!("Connecting to database...");
        let pool = create_pool(&DatabaseConfig::from(&settings.database)).await?;
        run_migrations(&pool).await?;
        DatabaseService::new(pool)
    };

    info!("Connecting to Redis...");
    let redis_service = RedisService::new(settings.redis.clone())?;
    let redis_service = if redis_service.health_check().await {
        Some(redis_service)
    } else {
        warn!("Redis unavailable, chat conversations will be kept in memory");
        None
    };

    info!("Initializing services...");
    let services = ServiceFactory::new(&settings, database, redis_service)?;

    let address = settings.bind_address();
    let state = AppState::new(services, settings);
    let cleanup = state.rate_limiter.start_cleanup(state.rate_limiter.window());
    let app = web::router(state);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!(address = %address, "VincuHub is ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cleanup.abort();
    info!("VincuHub has been shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
