use serde_json::json;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::services::AccessLevelService;

/// `banca migrate`
pub async fn migrate(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect_lazy(&config.database)?;
    DatabaseManager::migrate(&pool).await?;
    pool.close().await;

    output_success(
        output_format,
        "Migrations applied",
        Some(json!({ "database": DatabaseManager::redacted_url(&config.database.url) })),
    )
}

/// `banca seed-roles`
pub async fn seed_roles(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect_lazy(&config.database)?;
    let created = AccessLevelService::new(pool.clone()).ensure_defaults().await?;
    pool.close().await;

    output_success(
        output_format,
        "Default access levels ensured",
        Some(json!({ "created": created })),
    )
}
