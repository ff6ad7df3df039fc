use serde_json::json;

use crate::cli::{utils, OutputFormat};
use crate::config;
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();
    let pool = super::connect(config).await?;

    DatabaseManager::migrate(&pool).await?;
    utils::output_success(
        &output_format,
        "Migrations applied",
        Some(json!({ "environment": format!("{:?}", config.environment).to_lowercase() })),
    )
}
