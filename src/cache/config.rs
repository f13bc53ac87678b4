//! Cache configuration.
//!
//! Controls the repository cache via the `[cache]` section of `todo-service.toml`.

use std::{num::NonZeroUsize, str::FromStr, time::Duration};

const DEFAULT_TTL_SECONDS: u64 = 60;
const DEFAULT_MAX_ENTRIES: usize = 1024;

/// How a write removes the entries of its namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidationStrategy {
    /// List every key in the store and delete the ones under the namespace.
    #[default]
    Scan,
    /// Delete the keys this repository recorded when populating the cache.
    Tracked,
}

impl InvalidationStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            InvalidationStrategy::Scan => "scan",
            InvalidationStrategy::Tracked => "tracked",
        }
    }
}

impl FromStr for InvalidationStrategy {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "scan" => Ok(InvalidationStrategy::Scan),
            "tracked" => Ok(InvalidationStrategy::Tracked),
            other => Err(format!(
                "unknown strategy `{other}`, expected `scan` or `tracked`"
            )),
        }
    }
}

/// Resolved cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Route reads through the cache.
    pub enabled: bool,
    /// Lifetime of a populated entry.
    pub ttl_seconds: u64,
    /// Capacity of the in-memory store before LRU eviction.
    pub max_entries: usize,
    pub invalidation: InvalidationStrategy,
    /// Store "not found" results of item reads.
    pub cache_negative_lookups: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: DEFAULT_TTL_SECONDS,
            max_entries: DEFAULT_MAX_ENTRIES,
            invalidation: InvalidationStrategy::Scan,
            cache_negative_lookups: false,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl_seconds: settings.ttl.as_secs(),
            max_entries: settings.max_entries.get(),
            invalidation: settings.invalidation,
            cache_negative_lookups: settings.cache_negative_lookups,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Returns the store capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.ttl(), Duration::from_secs(60));
        assert_eq!(config.max_entries, 1024);
        assert_eq!(config.invalidation, InvalidationStrategy::Scan);
        assert!(!config.cache_negative_lookups);
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            max_entries: 0,
            ..Default::default()
        };
        assert_eq!(config.max_entries_non_zero().get(), 1);
    }

    #[test]
    fn strategy_names_parse_back() {
        for strategy in [InvalidationStrategy::Scan, InvalidationStrategy::Tracked] {
            assert_eq!(strategy.as_str().parse::<InvalidationStrategy>(), Ok(strategy));
        }
        assert_eq!(" TRACKED ".parse(), Ok(InvalidationStrategy::Tracked));
        assert!("lazy".parse::<InvalidationStrategy>().is_err());
    }
}
