//! The key-value substrate shared by the tracker and the cache.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::{Duration, Instant},
};

/// The handful of primitives the caching layer needs from a key-value store.
///
/// Implementations are expected to make [`KeyValueStore::incr()`] atomic
/// across concurrent callers; `lookup`/`store` pairs are deliberately *not*
/// required to be transactional (see [`crate::CachingFetcher`]).
pub trait KeyValueStore {
    /// Atomically increment the integer stored under `key` and return the new
    /// value, creating the key at 0 if it doesn't exist yet.
    fn incr(&self, key: &str) -> Result<u64, StoreUnavailable>;

    /// Read the value stored under `key`, or `None` if the key is absent or
    /// its expiry has lapsed. Must not mutate any state.
    fn get(&self, key: &str) -> Result<Option<String>, StoreUnavailable>;

    /// Write `value` under `key`, to expire after `ttl`. Overwrites any prior
    /// value and restarts the expiry clock.
    fn set_ex(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreUnavailable>;
}

impl<'s, S: KeyValueStore> KeyValueStore for &'s S {
    fn incr(&self, key: &str) -> Result<u64, StoreUnavailable> {
        (**self).incr(key)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreUnavailable> {
        (**self).get(key)
    }

    fn set_ex(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreUnavailable> {
        (**self).set_ex(key, value, ttl)
    }
}

/// The backing store couldn't service an operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("the key-value store is unavailable: {0}")]
pub struct StoreUnavailable(pub String);

/// An in-memory [`KeyValueStore`].
///
/// Entries expire lazily, on read. The store's notion of "now" can be moved
/// forward with [`MemoryStore::advance()`] so that expiry behaviour is
/// testable without actually sleeping.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    skew: Duration,
}

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| now < deadline)
    }
}

impl MemoryStore {
    /// Create a new, empty [`MemoryStore`].
    pub fn new() -> Self { MemoryStore::default() }

    /// Pretend `elapsed` has passed, bringing every expiry deadline that much
    /// closer.
    pub fn advance(&self, elapsed: Duration) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.skew += elapsed;
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreUnavailable> {
        self.inner
            .lock()
            .map_err(|_| StoreUnavailable("the store mutex was poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn incr(&self, key: &str) -> Result<u64, StoreUnavailable> {
        let mut inner = self.lock()?;
        let now = Instant::now() + inner.skew;

        let next = match inner.entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                let current: u64 = entry.value.parse().map_err(|_| {
                    StoreUnavailable(format!(
                        "the value under \"{}\" is not an integer",
                        key
                    ))
                })?;
                current + 1
            },
            _ => 1,
        };

        inner.entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at: None,
            },
        );

        Ok(next)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreUnavailable> {
        let inner = self.lock()?;
        let now = Instant::now() + inner.skew;

        Ok(inner
            .entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    fn set_ex(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreUnavailable> {
        let mut inner = self.lock()?;
        let now = Instant::now() + inner.skew;

        inner.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(now + ttl),
            },
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn counters_are_created_on_first_increment() {
        let store = MemoryStore::new();

        assert_eq!(store.incr("count:http://x").unwrap(), 1);
        assert_eq!(store.incr("count:http://x").unwrap(), 2);
        assert_eq!(store.incr("count:http://y").unwrap(), 1);
    }

    #[test]
    fn incrementing_a_non_integer_value_is_a_store_error() {
        let store = MemoryStore::new();
        store
            .set_ex("result:http://x", "<html>", Duration::from_secs(10))
            .unwrap();

        assert!(store.incr("result:http://x").is_err());
    }

    #[test]
    fn writes_overwrite_earlier_values() {
        let store = MemoryStore::new();

        store.set_ex("k", "first", Duration::from_secs(10)).unwrap();
        store.set_ex("k", "second", Duration::from_secs(10)).unwrap();

        assert_eq!(store.get("k").unwrap(), Some(String::from("second")));
    }

    #[test]
    fn values_disappear_once_the_ttl_lapses() {
        let store = MemoryStore::new();
        store.set_ex("k", "v", Duration::from_secs(10)).unwrap();

        store.advance(Duration::from_secs(9));
        assert_eq!(store.get("k").unwrap(), Some(String::from("v")));

        store.advance(Duration::from_secs(2));
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn rewriting_a_value_restarts_the_expiry_clock() {
        let store = MemoryStore::new();

        store.set_ex("k", "v", Duration::from_secs(10)).unwrap();
        store.advance(Duration::from_secs(6));
        store.set_ex("k", "v", Duration::from_secs(10)).unwrap();
        store.advance(Duration::from_secs(6));

        assert_eq!(store.get("k").unwrap(), Some(String::from("v")));
    }

    #[test]
    fn counters_never_expire() {
        let store = MemoryStore::new();
        store.incr("count:http://x").unwrap();

        store.advance(Duration::from_secs(60 * 60));

        assert_eq!(
            store.get("count:http://x").unwrap(),
            Some(String::from("1"))
        );
    }

    #[test]
    fn count_and_result_namespaces_never_collide() {
        let store = MemoryStore::new();

        store.incr("count:http://x").unwrap();
        store
            .set_ex("result:http://x", "<html>", Duration::from_secs(10))
            .unwrap();

        assert_eq!(
            store.get("count:http://x").unwrap(),
            Some(String::from("1"))
        );
        assert_eq!(
            store.get("result:http://x").unwrap(),
            Some(String::from("<html>"))
        );
    }
}
