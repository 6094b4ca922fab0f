//! A transparent caching and request-tracking layer for URL fetches.
//!
//! A [`CachingFetcher`] wraps a plain [`Fetcher`] and a [`KeyValueStore`].
//! Every call to [`CachingFetcher::fetch()`] bumps a per-URL request counter,
//! then either serves the body cached from an earlier fetch or asks the
//! wrapped [`Fetcher`] for a fresh one, caching that for the next 10 seconds.

#![forbid(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod cache;
mod fetch;
mod store;
mod track;

pub use cache::{CacheManager, CACHE_TTL};
pub use fetch::{FetchError, Fetcher, WebFetcher};
pub use store::{KeyValueStore, MemoryStore, StoreUnavailable};
pub use track::RequestTracker;

/// The ways a [`CachingFetcher::fetch()`] call can fail.
///
/// Collaborator failures are passed through as-is. There is no retrying,
/// no fallback values, and no local recovery anywhere in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The wrapped [`Fetcher`] failed. Nothing was cached, but the request
    /// was still counted.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The key-value store failed, at whichever step first touched it.
    #[error(transparent)]
    Store(#[from] StoreUnavailable),
}

/// A [`Fetcher`] wrapper which counts requests and caches bodies.
///
/// The fetcher and the store are passed in explicitly, so any implementation
/// (real HTTP client, test stub) can be substituted:
///
/// ```no_run
/// use pagecache::{CachingFetcher, MemoryStore, WebFetcher};
///
/// # async fn run() -> Result<(), pagecache::Error> {
/// let pages = CachingFetcher::new(WebFetcher::default(), MemoryStore::new());
/// let body = pages.fetch("http://example.com/").await?;
/// # Ok(())
/// # }
/// ```
///
/// Two concurrent callers that both miss the cache for the same URL will both
/// fetch and both write the result. That race is tolerated on purpose (last
/// writer wins and restarts the expiry window); the cache window is short and
/// fetching is presumed idempotent, so de-duplicating in-flight fetches isn't
/// worth the machinery.
#[derive(Debug)]
pub struct CachingFetcher<F, S> {
    fetcher: F,
    store: S,
}

impl<F, S> CachingFetcher<F, S>
where
    F: Fetcher,
    S: KeyValueStore,
{
    /// Wrap `fetcher`, caching and counting through `store`.
    pub fn new(fetcher: F, store: S) -> Self { CachingFetcher { fetcher, store } }

    /// Fetch the content at `url`, preferring the cached body if there is one.
    ///
    /// The request counter for `url` is bumped before anything else, so it
    /// reflects attempts rather than successes. A cache hit is returned
    /// without touching the wrapped [`Fetcher`] and without refreshing the
    /// entry's TTL. On a miss the fresh body is cached before it is returned;
    /// if that cache write fails the failure is surfaced rather than the
    /// body.
    pub async fn fetch(&self, url: &str) -> Result<String, Error> {
        let requests = RequestTracker::new(&self.store).record_request(url)?;
        log::debug!("\"{}\" has been requested {} times", url, requests);

        let cache = CacheManager::new(&self.store);

        if let Some(body) = cache.lookup(url)? {
            log::debug!("Cache hit for \"{}\"", url);
            return Ok(body);
        }

        log::debug!("Cache miss for \"{}\", fetching", url);
        let body = self.fetcher.fetch(url).await?;
        cache.store(url, &body)?;

        Ok(body)
    }
}
