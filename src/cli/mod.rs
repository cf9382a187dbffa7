pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "banca")]
#[command(about = "Banca CLI - serve and administer the Banca marketplace API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve,

    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Create the default access levels (adm, Vendedor, Comprador)")]
    SeedRoles,

    #[command(about = "Create an administrator account")]
    CreateAdmin(commands::admin::CreateAdminArgs),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::config().clone();

    match cli.command {
        Commands::Serve => crate::server::run(config).await,
        Commands::Migrate => commands::database::migrate(&config, output_format).await,
        Commands::SeedRoles => commands::database::seed_roles(&config, output_format).await,
        Commands::CreateAdmin(args) => commands::admin::create_admin(&config, args, output_format).await,
    }
}
