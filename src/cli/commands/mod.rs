pub mod admin;
pub mod migrate;
pub mod serve;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::database::DatabaseManager;

/// Eager pool for commands that need the database right away
pub(crate) async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    Ok(DatabaseManager::connect(&config.database).await?)
}
