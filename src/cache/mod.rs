//! Cache-aside layer shared by the list and detail endpoints.
//!
//! Reads go through [`Cache::remember`]: the cached JSON is returned when
//! present, otherwise the loader runs against the database and its result is
//! stored with the configured TTL. Every write invalidates the resource's whole
//! key prefix, so the next read is always served fresh.

mod memory;
mod redis_store;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::CacheConfig;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error(transparent)]
    Redis(#[from] redis::RedisError),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Key/value backend holding serialized JSON
#[async_trait]
pub trait CacheStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every key starting with `prefix`, returning how many went away
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;
}

#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
    ttl_secs: u64,
    prefix: String,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            ttl_secs: config.ttl_secs,
            prefix: config.key_prefix.clone(),
        }
    }

    /// Redis when a URL is configured, the in-process store otherwise
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let store: Arc<dyn CacheStore> = match &config.redis_url {
            Some(url) => Arc::new(RedisStore::connect(url).await?),
            None => {
                info!("REDIS_URL not set, using in-process cache");
                Arc::new(MemoryStore::new(config.max_local_entries))
            }
        };
        Ok(Self::new(store, config))
    }

    pub fn in_memory(config: &CacheConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new(config.max_local_entries)), config)
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Cached value for `key`; backend and decoding failures count as a miss
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = self.full_key(key);
        match self.store.get(&full_key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(key = %full_key, "cache hit");
                    Some(value)
                }
                Err(e) => {
                    warn!(key = %full_key, error = %e, "discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => {
                debug!(key = %full_key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key = %full_key, error = %e, "cache read failed");
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        let full_key = self.full_key(key);
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %full_key, error = %e, "cache value not serializable");
                return;
            }
        };
        if let Err(e) = self.store.set(&full_key, raw, self.ttl_secs).await {
            warn!(key = %full_key, error = %e, "cache write failed");
        }
    }

    pub async fn delete(&self, key: &str) {
        let full_key = self.full_key(key);
        if let Err(e) = self.store.delete(&full_key).await {
            warn!(key = %full_key, error = %e, "cache delete failed");
        }
    }

    /// Cache-aside read: serve from cache, else load and populate
    pub async fn remember<T, E, F, Fut>(&self, key: &str, loader: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get_json(key).await {
            return Ok(hit);
        }
        let value = loader().await?;
        self.set_json(key, &value).await;
        Ok(value)
    }

    /// Drop every cached entry under each resource prefix
    pub async fn invalidate(&self, resources: &[&str]) {
        for resource in resources {
            let prefix = self.full_key(&format!("{}:", resource));
            match self.store.delete_prefix(&prefix).await {
                Ok(count) => debug!(prefix = %prefix, count, "cache invalidated"),
                Err(e) => warn!(prefix = %prefix, error = %e, "cache invalidation failed"),
            }
        }
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        self.store.ping().await
    }
}

/// Key prefixes, one per cached resource
pub mod resource {
    pub const STUDENTS: &str = "students";
    pub const TEACHERS: &str = "teachers";
    pub const ADMINS: &str = "admins";
    pub const CLASSES: &str = "classes";
    pub const SCHEDULES: &str = "schedules";
    pub const ATTENDANCE: &str = "attendance";
    pub const BOOKS: &str = "books";
    pub const BOOK_ASSIGN: &str = "book-assign";
    pub const PAYOUTS: &str = "payout";
    pub const MESSAGES: &str = "messages";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const RECORDINGS: &str = "recording";
    pub const SCREENSHOTS: &str = "screenshot";
    pub const APPLICATIONS: &str = "applications";
    pub const DASHBOARD: &str = "dashboard";
}

/// Key for one record of a resource
pub fn item_key(resource: &str, id: Uuid) -> String {
    format!("{}:item:{}", resource, id)
}

/// Key for a list query; `scope` captures filters, paging and the viewer
pub fn list_key<S: Serialize>(resource: &str, scope: &S) -> String {
    let encoded = serde_json::to_vec(scope).unwrap_or_default();
    let digest = Sha256::digest(&encoded);
    format!("{}:list:{}", resource, hex::encode(&digest[..16]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> Cache {
        Cache::in_memory(&AppConfig::testing().cache)
    }

    #[tokio::test]
    async fn remember_populates_on_miss_and_serves_hits() {
        let cache = cache();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<Vec<i32>, ()> = cache
                .remember("students:list:a", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await;
            assert_eq!(value.unwrap(), vec![1, 2, 3]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn loader_errors_are_not_cached() {
        let cache = cache();
        let failed: Result<i32, &str> = cache.remember("books:item:x", || async { Err("db down") }).await;
        assert!(failed.is_err());

        let loaded: Result<i32, &str> = cache.remember("books:item:x", || async { Ok(7) }).await;
        assert_eq!(loaded.unwrap(), 7);
    }

    #[tokio::test]
    async fn invalidate_drops_only_matching_prefixes() {
        let cache = cache();
        cache.set_json("students:list:1", &json!([1])).await;
        cache.set_json("students:item:2", &json!({"id": 2})).await;
        cache.set_json("studentsx:item:3", &json!(3)).await;
        cache.set_json("classes:list:1", &json!([])).await;

        cache.invalidate(&["students"]).await;

        assert!(cache.get_json::<serde_json::Value>("students:list:1").await.is_none());
        assert!(cache.get_json::<serde_json::Value>("students:item:2").await.is_none());
        assert!(cache.get_json::<serde_json::Value>("studentsx:item:3").await.is_some());
        assert!(cache.get_json::<serde_json::Value>("classes:list:1").await.is_some());
    }

    #[tokio::test]
    async fn read_after_invalidation_is_fresh() {
        let cache = cache();
        let first: Result<String, ()> = cache.remember("books:list:k", || async { Ok("old".to_string()) }).await;
        assert_eq!(first.unwrap(), "old");

        cache.invalidate(&["books"]).await;

        let second: Result<String, ()> = cache.remember("books:list:k", || async { Ok("new".to_string()) }).await;
        assert_eq!(second.unwrap(), "new");
    }

    #[test]
    fn list_keys_are_stable_and_scope_sensitive() {
        let a = list_key("students", &json!({"page": 1, "teacher": "x"}));
        let b = list_key("students", &json!({"page": 1, "teacher": "x"}));
        let c = list_key("students", &json!({"page": 2, "teacher": "x"}));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("students:list:"));
    }

    #[test]
    fn item_keys_share_the_resource_prefix() {
        let id = Uuid::nil();
        assert_eq!(item_key("payout", id), format!("payout:item:{}", id));
    }
}
