use anyhow::{Context, Result};
use club_registration_api::{
    app,
    config::{self, StorageBackend},
    middleware,
};
use domain::store::ClubStore;
use persistence::store::{MemoryClubStore, PgClubStore, TieredClubStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging)
        .context("Failed to initialize logging")?;
    middleware::init_metrics().context("Failed to install Prometheus recorder")?;

    info!("Starting Club Registration API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config).await?;

    let app = app::create_app(config.clone(), store);

    let addr = config.socket_addr()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn build_store(config: &config::Config) -> Result<Arc<dyn ClubStore>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryClubStore::new()))
        }
        StorageBackend::Postgres => {
            let pool = persistence::db::create_pool(&(&config.database).into())
                .await
                .context("Failed to connect to PostgreSQL")?;

            info!("Running database migrations...");
            persistence::db::run_migrations(&pool).await?;
            info!("Migrations completed");

            let primary: Arc<dyn ClubStore> = Arc::new(PgClubStore::new(pool));
            if config.storage.fallback_enabled {
                info!("Read fallback to in-memory snapshot enabled");
                let secondary: Arc<dyn ClubStore> = Arc::new(MemoryClubStore::new());
                Ok(Arc::new(TieredClubStore::new(primary, secondary)))
            } else {
                Ok(primary)
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
