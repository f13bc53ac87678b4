use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use super::lock::mutex_lock;

const SOURCE: &str = "cache::index";

/// Keys a repository has populated since its last invalidation.
///
/// Lets invalidation run against stores that cannot list their keys. Bounded by the store
/// capacity and kept in the same recency order as the store: a key is refreshed whenever
/// it is written or served. The store can never hold more keys of one repository than its
/// capacity, so the keys it still holds are always among the most recent ones here. An
/// entry can outlive its cache value (TTL expiry); deleting such a key is a no-op.
#[derive(Debug)]
pub struct KeyIndex {
    keys: Mutex<LruCache<String, ()>>,
}

impl KeyIndex {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            keys: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Record `key` as populated or served, making it the most recent entry.
    pub fn record(&self, key: &str) {
        let mut keys = mutex_lock(&self.keys, SOURCE, "record");
        if keys.get(key).is_none() {
            keys.put(key.to_string(), ());
        }
    }

    /// Take every recorded key, leaving the index empty.
    pub fn drain(&self) -> Vec<String> {
        let mut keys = mutex_lock(&self.keys, SOURCE, "drain");
        let drained = keys.iter().map(|(key, _)| key.clone()).collect();
        keys.clear();
        drained
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.keys, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn record_deduplicates_and_drain_empties() {
        let index = KeyIndex::new(capacity(8));
        index.record("todo-repository-get-todos");
        index.record("todo-repository-get-todos");
        index.record("todo-repository-get-todo?key=1");
        assert_eq!(index.len(), 2);

        let mut drained = index.drain();
        drained.sort();
        assert_eq!(
            drained,
            vec![
                "todo-repository-get-todo?key=1".to_string(),
                "todo-repository-get-todos".to_string(),
            ]
        );
        assert!(index.is_empty());
    }

    #[test]
    fn index_stays_within_capacity() {
        let index = KeyIndex::new(capacity(2));
        for n in 0..1000 {
            index.record(&format!("activity-repository-get-activities?where=email=u{n}@mail.com"));
        }
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn recording_again_refreshes_recency() {
        let index = KeyIndex::new(capacity(2));
        index.record("a");
        index.record("b");
        index.record("a");
        index.record("c");

        let mut drained = index.drain();
        drained.sort();
        assert_eq!(drained, vec!["a".to_string(), "c".to_string()]);
    }
}
