//! Rollcall
//!
//! Store bootstrap entry point: loads settings, initializes logging, opens the
//! configured event store, applies migrations and verifies it is reachable.

use anyhow::Context;
use tracing::info;

use rollcall::{
    config::{Settings, StorageBackend},
    database::{create_pool, run_migrations, DatabaseService, EventStore, MemoryStore},
    utils::logging,
    RegistrationEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load settings")?;
    settings.validate()?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", rollcall::info());

    match settings.storage.backend {
        StorageBackend::Postgres => {
            info!("Connecting to database...");
            let pool = create_pool(&settings.database).await?;

            if settings.storage.run_migrations {
                run_migrations(&pool).await?;
            }

            let engine = RegistrationEngine::new(DatabaseService::new(pool), settings.registration.clone());
            report(&engine).await?;
        }
        StorageBackend::Memory => {
            info!("Using in-memory event store");
            let engine = RegistrationEngine::new(MemoryStore::new(), settings.registration.clone());
            report(&engine).await?;
        }
    }

    Ok(())
}

/// Health check the store and log what it currently serves
async fn report<S: EventStore>(engine: &RegistrationEngine<S>) -> anyhow::Result<()> {
    engine.store().health_check().await.context("event store health check failed")?;

    let upcoming = engine.upcoming_events(None).await?;
    info!(upcoming_events = upcoming.len(), "Event store is ready");

    Ok(())
}
