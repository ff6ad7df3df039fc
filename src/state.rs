use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{AuthError, TokenKeys};
use crate::cache::Cache;
use crate::chat::ChatHub;
use crate::config::AppConfig;
use crate::uploads::{DriveMirror, UploadStore};

/// Shared handles cloned into every request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: PgPool,
    pub cache: Cache,
    pub tokens: TokenKeys,
    pub chat: ChatHub,
    pub uploads: UploadStore,
}

impl AppState {
    pub fn new(config: AppConfig, pool: PgPool, cache: Cache) -> Result<Self, AuthError> {
        let tokens = TokenKeys::from_config(&config.security)?;
        let drive = config.drive.clone().map(DriveMirror::new);
        let uploads = UploadStore::new(
            config.server.uploads_dir.clone(),
            config.server.max_upload_bytes,
            drive,
        );

        Ok(Self {
            config: Arc::new(config),
            pool,
            cache,
            tokens,
            chat: ChatHub::new(),
            uploads,
        })
    }
}
