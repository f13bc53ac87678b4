//! Repository cache.
//!
//! Wraps a resource's backing store with a read-through cache:
//!
//! - **Reads** derive a deterministic key from the operation and its filter, serve a
//!   cached value when present, and populate the cache on a miss.
//! - **Writes** run against the backing store first, then drop every cached key under
//!   the resource's namespace.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 60
//! max_entries = 1024
//! invalidation = "scan"   # or "tracked"
//! cache_negative_lookups = false
//! ```
//!
//! The bundled [`MemoryCacheStore`] is process-local. Running several server processes
//! requires a shared store behind the [`CacheStore`] trait.

mod config;
mod index;
mod keys;
mod lock;
mod repository;
mod store;

pub use config::{CacheConfig, InvalidationStrategy};
pub use index::KeyIndex;
pub use keys::{FilterMap, FilterValue, KeyInput, Scalar, ToFilter, encode_filter, encode_key};
pub use repository::{CachedRepository, ResourceNames};
pub use store::{CacheError, CacheStore, MemoryCacheStore};

pub const METRIC_CACHE_HIT: &str = "todo_service_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "todo_service_cache_miss_total";
pub const METRIC_CACHE_INVALIDATED: &str = "todo_service_cache_invalidated_keys_total";
pub const METRIC_CACHE_ERROR: &str = "todo_service_cache_error_total";
