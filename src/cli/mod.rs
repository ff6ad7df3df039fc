pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "academy-api")]
#[command(about = "Academy API - school management backend for the tutoring portal")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run migrations and start the HTTP server")]
    Serve {
        #[arg(long, help = "Skip the embedded migrations on startup")]
        skip_migrations: bool,
    },

    #[command(about = "Apply the embedded database migrations and exit")]
    Migrate,

    #[command(about = "Create the first super admin account")]
    CreateSuperAdmin {
        #[arg(long, help = "Display name")]
        name: String,
        #[arg(long, help = "Login email")]
        email: String,
        #[arg(long, help = "Password (at least 8 characters)")]
        password: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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

    match cli.command.unwrap_or(Commands::Serve { skip_migrations: false }) {
        Commands::Serve { skip_migrations } => commands::serve::handle(skip_migrations).await,
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::CreateSuperAdmin { name, email, password } => {
            commands::admin::create_super_admin(name, email, password, output_format).await
        }
    }
}
