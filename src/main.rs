use anyhow::bail;
use tracing_subscriber::EnvFilter;

use banca_api::{config, is_production, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("banca_api=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Banca API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        if is_production!() {
            bail!("JWT_SECRET must be set in production");
        }
        tracing::warn!("JWT_SECRET is not set; sign-in and protected routes will fail");
    }

    server::run(config.clone()).await
}
