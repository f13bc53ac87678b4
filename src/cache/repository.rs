//! Read-through repository wrapper with namespace invalidation.

use std::sync::Arc;

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::application::repos::{RepoError, ResourceStore};

use super::config::{CacheConfig, InvalidationStrategy};
use super::index::KeyIndex;
use super::keys::{KeyInput, ToFilter, encode_key};
use super::store::{CacheError, CacheStore};
use super::{METRIC_CACHE_ERROR, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATED, METRIC_CACHE_MISS};

/// Naming of one cached resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    /// Prefix of every key the repository writes, e.g. `activity-repository`.
    pub namespace: String,
    pub singular: String,
    pub plural: String,
}

impl ResourceNames {
    pub fn new(
        namespace: impl Into<String>,
        singular: impl Into<String>,
        plural: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            singular: singular.into(),
            plural: plural.into(),
        }
    }

    fn list_operation(&self) -> String {
        format!("get-{}", self.plural)
    }

    fn item_operation(&self) -> String {
        format!("get-{}", self.singular)
    }
}

/// Decoded cache lookup.
enum Lookup<T> {
    Hit(T),
    Miss,
}

pub struct CachedRepository<S: ResourceStore + ?Sized> {
    store: Arc<S>,
    cache: Arc<dyn CacheStore>,
    names: ResourceNames,
    config: CacheConfig,
    index: KeyIndex,
}

impl<S: ResourceStore + ?Sized> CachedRepository<S> {
    pub fn new(
        store: Arc<S>,
        cache: Arc<dyn CacheStore>,
        names: ResourceNames,
        config: CacheConfig,
    ) -> Self {
        let index = KeyIndex::new(config.max_entries_non_zero());
        Self {
            store,
            cache,
            names,
            config,
            index,
        }
    }

    pub fn names(&self) -> &ResourceNames {
        &self.names
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub async fn create(&self, params: S::Create) -> Result<S::Entity, RepoError> {
        let created = self.store.create(params).await?;
        self.invalidate().await;
        Ok(created)
    }

    pub async fn get_all(&self, filter: Option<&S::Filter>) -> Result<Vec<S::Entity>, RepoError> {
        if !self.config.enabled {
            return self.store.find_all(filter).await;
        }

        let encoded = filter.map(ToFilter::to_filter);
        let input = encoded.as_ref().map_or(KeyInput::Absent, KeyInput::Filter);
        let key = encode_key(&self.names.namespace, &self.names.list_operation(), input);

        if let Lookup::Hit(entities) = self.lookup::<Vec<S::Entity>>(&key).await {
            return Ok(entities);
        }

        let entities = self.store.find_all(filter).await?;
        self.populate(&key, &entities).await;
        Ok(entities)
    }

    pub async fn get_by_id(&self, id: S::Id) -> Result<Option<S::Entity>, RepoError> {
        if !self.config.enabled {
            return self.store.find_by_pk(id).await;
        }

        let id_text = id.to_string();
        let key = encode_key(
            &self.names.namespace,
            &self.names.item_operation(),
            KeyInput::Id(&id_text),
        );

        if let Lookup::Hit(entity) = self.lookup::<Option<S::Entity>>(&key).await {
            return Ok(entity);
        }

        let entity = self.store.find_by_pk(id).await?;
        if entity.is_some() || self.config.cache_negative_lookups {
            self.populate(&key, &entity).await;
        }
        Ok(entity)
    }

    pub async fn update(
        &self,
        entity: &S::Entity,
        params: S::Update,
    ) -> Result<S::Entity, RepoError> {
        let updated = self.store.update(entity, params).await?;
        self.invalidate().await;
        Ok(updated)
    }

    /// Destroy the entity and hand back the snapshot it had before deletion.
    pub async fn delete(&self, entity: S::Entity) -> Result<S::Entity, RepoError> {
        self.store.destroy(&entity).await?;
        self.invalidate().await;
        Ok(entity)
    }

    /// Drop every cached key under this repository's namespace.
    ///
    /// Cache failures are logged and swallowed; the caller's write has already happened.
    pub async fn invalidate(&self) {
        if !self.config.enabled {
            return;
        }

        let namespace = self.names.namespace.as_str();
        let keys = match self.config.invalidation {
            InvalidationStrategy::Tracked => self.index.drain(),
            InvalidationStrategy::Scan => match self.cache.keys().await {
                Ok(keys) => keys
                    .into_iter()
                    .filter(|key| key.starts_with(namespace))
                    .collect(),
                Err(err @ CacheError::Unsupported { .. }) => {
                    warn!(
                        namespace,
                        error = %err,
                        "cache store cannot list keys; namespace left to expire"
                    );
                    return;
                }
                Err(err) => {
                    self.record_error("keys", &err);
                    return;
                }
            },
        };

        let mut removed = 0_u64;
        for key in &keys {
            match self.cache.del(key).await {
                Ok(()) => removed += 1,
                Err(err) => {
                    self.record_error("del", &err);
                    // Keep the key reachable for the next write.
                    self.track(key);
                }
            }
        }

        counter!(METRIC_CACHE_INVALIDATED, "namespace" => self.names.namespace.clone())
            .increment(removed);
        debug!(
            namespace,
            strategy = self.config.invalidation.as_str(),
            removed,
            "invalidated cache namespace"
        );
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Lookup<T> {
        let cached = match self.cache.get(key).await {
            Ok(cached) => cached,
            Err(err) => {
                // Fail open: the store answers instead.
                self.record_error("get", &err);
                return Lookup::Miss;
            }
        };

        let Some(value) = cached else {
            self.record_miss(key);
            return Lookup::Miss;
        };

        match serde_json::from_value::<T>(value) {
            Ok(decoded) => {
                self.track(key);
                counter!(METRIC_CACHE_HIT, "namespace" => self.names.namespace.clone())
                    .increment(1);
                debug!(namespace = %self.names.namespace, key, "cache hit");
                Lookup::Hit(decoded)
            }
            Err(err) => {
                self.record_error("decode", &CacheError::from(err));
                self.record_miss(key);
                Lookup::Miss
            }
        }
    }

    async fn populate<T: Serialize>(&self, key: &str, value: &T) {
        let encoded = match serde_json::to_value(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                self.record_error("encode", &CacheError::from(err));
                return;
            }
        };

        match self.cache.set(key, encoded, self.config.ttl()).await {
            Ok(()) => {
                self.track(key);
                debug!(
                    namespace = %self.names.namespace,
                    key,
                    ttl_seconds = self.config.ttl_seconds,
                    "populated cache entry"
                );
            }
            Err(err) => self.record_error("set", &err),
        }
    }

    fn track(&self, key: &str) {
        if self.config.invalidation == InvalidationStrategy::Tracked {
            self.index.record(key);
        }
    }

    fn record_miss(&self, key: &str) {
        counter!(METRIC_CACHE_MISS, "namespace" => self.names.namespace.clone()).increment(1);
        debug!(namespace = %self.names.namespace, key, "cache miss");
    }

    fn record_error(&self, op: &'static str, err: &CacheError) {
        counter!(
            METRIC_CACHE_ERROR,
            "namespace" => self.names.namespace.clone(),
            "op" => op
        )
        .increment(1);
        warn!(namespace = %self.names.namespace, op, error = %err, "cache operation failed");
    }
}
