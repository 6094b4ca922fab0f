use crate::store::{KeyValueStore, StoreUnavailable};
use std::time::Duration;

/// How long a freshly stored result stays servable before it expires.
pub const CACHE_TTL: Duration = Duration::from_secs(10);

/// Reads and writes cached fetch results.
///
/// Results live under the `result:` namespace, keyed by URL, and expire
/// [`CACHE_TTL`] after they were written. Absence of a result is the normal
/// cache-miss state, not an error, and an empty body is a perfectly valid
/// thing to cache (presence is decided by key existence, never by content).
#[derive(Debug)]
pub struct CacheManager<S> {
    store: S,
}

impl<S: KeyValueStore> CacheManager<S> {
    /// Create a [`CacheManager`] on top of `store`.
    pub fn new(store: S) -> Self { CacheManager { store } }

    /// Look up the cached body for `url`, if one is still live.
    ///
    /// Strictly read-only: a lookup never touches the expiry clock.
    pub fn lookup(&self, url: &str) -> Result<Option<String>, StoreUnavailable> {
        self.store.get(&format!("result:{}", url))
    }

    /// Store `body` as the result for `url`, (re)starting the expiry window.
    ///
    /// Overwrites whatever was there before. Storing the same body twice has
    /// no observable effect beyond the expiry reset.
    pub fn store(&self, url: &str, body: &str) -> Result<(), StoreUnavailable> {
        self.store.set_ex(&format!("result:{}", url), body, CACHE_TTL)
    }
}
