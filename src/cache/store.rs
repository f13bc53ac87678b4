//! Cache store capability and the process-local implementation.

use std::{num::NonZeroUsize, sync::RwLock, time::Duration};

use async_trait::async_trait;
use lru::LruCache;
use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store does not support `{operation}`")]
    Unsupported { operation: &'static str },
    #[error("cache value could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("cache backend error: {message}")]
    Backend { message: String },
}

impl CacheError {
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Key-value cache consumed by [`super::CachedRepository`].
///
/// Each call must be atomic per key. Values are opaque JSON documents.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;

    async fn del(&self, key: &str) -> Result<(), CacheError>;

    /// Enumerate live keys. Stores that cannot enumerate keep the default.
    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        Err(CacheError::unsupported("keys"))
    }
}

struct Entry {
    value: Value,
    expires_at: Instant,
}

/// In-process cache with per-entry TTL and LRU eviction.
pub struct MemoryCacheStore {
    entries: RwLock<LruCache<String, Entry>>,
}

impl MemoryCacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_capacity(config.max_entries_non_zero())
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Number of stored entries, expired ones included until they are touched.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let fresh = entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone());
        if fresh.is_none() {
            entries.pop(key);
        }
        Ok(fresh)
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        let evicted = rw_write(&self.entries, SOURCE, "set").push(key.to_string(), entry);
        if let Some((evicted_key, _)) = evicted.filter(|(evicted_key, _)| evicted_key != key) {
            debug!(key = %evicted_key, "evicted least recently used cache entry");
        }
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        rw_write(&self.entries, SOURCE, "del").pop(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        let entries = rw_read(&self.entries, SOURCE, "keys");
        Ok(entries
            .iter()
            .filter(|(_, entry)| entry.expires_at > now)
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use serde_json::json;

    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn set_get_del_roundtrip() {
        let store = MemoryCacheStore::new(&CacheConfig::default());

        assert!(store.get("todo-repository-get-todo?key=1").await.unwrap().is_none());

        store
            .set("todo-repository-get-todo?key=1", json!({ "id": 1 }), TTL)
            .await
            .unwrap();
        assert_eq!(
            store.get("todo-repository-get-todo?key=1").await.unwrap(),
            Some(json!({ "id": 1 }))
        );

        store.del("todo-repository-get-todo?key=1").await.unwrap();
        assert!(store.get("todo-repository-get-todo?key=1").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemoryCacheStore::new(&CacheConfig::default());
        store.set("k", json!(1), Duration::from_secs(5)).await.unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(store.get("k").await.unwrap(), Some(json!(1)));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn keys_skip_expired_entries() {
        let store = MemoryCacheStore::new(&CacheConfig::default());
        store.set("short", json!(1), Duration::from_secs(1)).await.unwrap();
        store.set("long", json!(2), TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(store.keys().await.unwrap(), vec!["long".to_string()]);
    }

    #[tokio::test]
    async fn overwrite_replaces_value() {
        let store = MemoryCacheStore::new(&CacheConfig::default());
        store.set("k", json!("old"), TTL).await.unwrap();
        store.set("k", json!("new"), TTL).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(json!("new")));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn lru_eviction() {
        let config = CacheConfig {
            max_entries: 2,
            ..Default::default()
        };
        let store = MemoryCacheStore::new(&config);

        store.set("a", json!(1), TTL).await.unwrap();
        store.set("b", json!(2), TTL).await.unwrap();
        assert!(store.get("a").await.unwrap().is_some());

        // "b" is now least recently used
        store.set("c", json!(3), TTL).await.unwrap();

        assert!(store.get("a").await.unwrap().is_some());
        assert!(store.get("b").await.unwrap().is_none());
        assert!(store.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn store_recovers_from_poisoned_lock() {
        let store = MemoryCacheStore::new(&CacheConfig::default());

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store
                .entries
                .write()
                .expect("entries lock should be acquired");
            panic!("poison entries lock");
        }));

        store.set("k", json!(1), TTL).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!(1)));
    }
}
