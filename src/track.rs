use crate::store::{KeyValueStore, StoreUnavailable};

/// Keeps a running total of how many times each URL has been asked for.
///
/// The counter is bumped once per logical request, whether or not the request
/// ends up being served from cache, and is never reset or expired. It lives
/// under the `count:` namespace so it can never collide with a cached result
/// for the same URL.
#[derive(Debug)]
pub struct RequestTracker<S> {
    store: S,
}

impl<S: KeyValueStore> RequestTracker<S> {
    /// Create a [`RequestTracker`] on top of `store`.
    pub fn new(store: S) -> Self { RequestTracker { store } }

    /// Record one more request for `url` and return the new total.
    ///
    /// Atomicity is delegated to the store's increment primitive, so this is
    /// safe under arbitrary concurrent callers. Store failures are surfaced
    /// as-is, never retried.
    pub fn record_request(&self, url: &str) -> Result<u64, StoreUnavailable> {
        self.store.incr(&format!("count:{}", url))
    }
}
