use anyhow::Context;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::routes;
use crate::state::AppState;
use crate::storage::build_storage;

/// Wire up the pool, storage backend and router, then serve until Ctrl-C
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect_lazy(&config.database)?;

    if config.database.run_migrations {
        DatabaseManager::migrate(&pool)
            .await
            .context("failed to apply database migrations")?;
    }

    let storage = build_storage(&config.upload)
        .await
        .context("failed to initialise image storage")?;

    let bind_addr = config.bind_addr();
    let state = AppState::new(config, pool.clone(), storage);
    let app = routes::app(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Banca API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
