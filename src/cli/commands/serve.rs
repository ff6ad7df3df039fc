use anyhow::anyhow;

use crate::cache::Cache;
use crate::config::{self, AppConfig};
use crate::database::DatabaseManager;
use crate::state::AppState;
use crate::{is_development, server};

pub async fn handle(skip_migrations: bool) -> anyhow::Result<()> {
    let config: AppConfig = config::config().clone();
    config.validate().map_err(|e| anyhow!(e))?;
    tracing::info!("Starting Academy API in {:?} mode", config.environment);

    if is_development!() && !config.security.secure_cookies {
        tracing::warn!("Session cookies are not Secure; use HTTPS and SECURE_COOKIES=true outside development");
    }

    let pool = super::connect(&config).await?;
    if skip_migrations {
        tracing::info!("Skipping migrations");
    } else {
        DatabaseManager::migrate(&pool).await?;
    }

    let cache = match Cache::connect(&config.cache).await {
        Ok(cache) => cache,
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, falling back to in-process cache");
            Cache::in_memory(&config.cache)
        }
    };

    tokio::fs::create_dir_all(&config.server.uploads_dir).await?;

    let state = AppState::new(config, pool, cache)?;
    server::serve(state).await
}
