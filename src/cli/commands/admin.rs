use anyhow::bail;
use clap::Args;
use serde_json::json;

use crate::auth::hash_password_async;
use crate::cli::{
    utils::{output_error, output_success},
    OutputFormat,
};
use crate::config::AppConfig;
use crate::database::models::NewUser;
use crate::database::DatabaseManager;
use crate::services::{AccessLevelService, UserService};
use crate::types::Role;

#[derive(Debug, Args)]
pub struct CreateAdminArgs {
    #[arg(long, help = "Display name")]
    pub name: String,
    #[arg(long, help = "Login email")]
    pub email: String,
    #[arg(long, help = "CPF (at least 11 characters)")]
    pub cpf: String,
    #[arg(long, help = "Password (at least 6 characters)")]
    pub password: String,
}

impl CreateAdminArgs {
    fn check(&self) -> Result<(), &'static str> {
        if self.name.trim().chars().count() < 3 {
            return Err("name must be at least 3 characters");
        }
        if !self.email.contains('@') {
            return Err("email is not valid");
        }
        if self.cpf.chars().count() < 11 {
            return Err("cpf must be at least 11 characters");
        }
        if self.password.chars().count() < 6 {
            return Err("password must be at least 6 characters");
        }
        Ok(())
    }
}

/// `banca create-admin` - the only way to obtain the `adm` access level
pub async fn create_admin(config: &AppConfig, args: CreateAdminArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    if let Err(message) = args.check() {
        output_error(output_format, message, Some("VALIDATION_ERROR"))?;
        bail!("invalid arguments: {}", message);
    }

    let pool = DatabaseManager::connect_lazy(&config.database)?;
    let users = UserService::new(pool.clone());
    let levels = AccessLevelService::new(pool.clone());

    if users.find_by_email(&args.email).await?.is_some() {
        bail!("a user with email {} already exists", args.email);
    }
    if users.find_by_cpf(&args.cpf).await?.is_some() {
        bail!("a user with cpf {} already exists", args.cpf);
    }

    levels.ensure_defaults().await?;
    let Some(admin_level) = levels.find_by_name(Role::Admin.as_str()).await? else {
        bail!("access level {} is missing", Role::Admin);
    };

    let password_hash = hash_password_async(args.password, config.security.bcrypt_cost).await?;
    let user = users
        .create(
            NewUser {
                name: args.name.trim().to_string(),
                email: args.email,
                cpf: args.cpf,
                password_hash,
            },
            admin_level.id,
        )
        .await?;
    pool.close().await;

    tracing::info!("Created administrator {}", user.id);
    output_success(
        output_format,
        "Administrator created",
        Some(json!({ "id": user.id, "name": user.name, "email": user.email })),
    )
}
