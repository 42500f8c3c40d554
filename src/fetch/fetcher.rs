use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cached::stores::ExpiringValueCache;
use cached::{CanExpire, Cached};
use serde_json::Value;
use tracing::debug;

use crate::session::SessionManager;
use crate::utils::log_throttle::throttled;

const CACHE_HIT_LOG_WINDOW: Duration = Duration::from_secs(30);

/// Upper bound on distinct cache keys held at once; least-recently-used
/// entries are dropped beyond this.
const CACHE_CAPACITY: usize = 512;

/// A cached response body plus its optional expiry deadline.
#[derive(Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl CanExpire for CacheEntry {
    fn is_expired(&self) -> bool {
        self.expires_at
            .map_or(false, |deadline| Instant::now() >= deadline)
    }
}

/// Options recognized by `Fetcher::fetch`.
#[derive(Clone, Debug, Default)]
pub struct FetchOptions {
    /// Bypass the shared cache entirely: no reads, no writes.
    pub skip_cache: bool,
    /// Cache key for this request; defaults to the URL.
    pub cache_key: Option<String>,
    /// Ignore any cached value and hit the network.
    pub force_refresh: bool,
    /// How long a stored value stays fresh. None means no deadline.
    pub cache_expiry: Option<Duration>,
    /// Extra headers forwarded on the request.
    pub headers: Vec<(String, String)>,
}

/// A fetched value, flagged when it was served from the shared cache.
#[derive(Clone, Debug)]
pub struct Fetched {
    pub value: Value,
    pub was_cached: bool,
}

/// Wraps the authenticated request factory for read endpoints, with
/// optional response caching.
///
/// Clones share one keyed cache, so a host that hands out clones of a
/// single Fetcher gets process-wide caching. A fresh `AuthClient` is built
/// per call, so every request sees the current token and the global 401
/// policy applies.
#[derive(Clone)]
pub struct Fetcher {
    session: Arc<SessionManager>,
    cache: Arc<Mutex<ExpiringValueCache<String, CacheEntry>>>,
}

impl Fetcher {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Fetcher {
            session,
            cache: Arc::new(Mutex::new(ExpiringValueCache::with_size(CACHE_CAPACITY))),
        }
    }

    /// Fetch `url`, consulting the shared cache per the options. A fresh,
    /// non-expired entry is returned without any network call.
    pub async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<Fetched, String> {
        let key = options
            .cache_key
            .clone()
            .unwrap_or_else(|| url.to_string());

        if !options.skip_cache && !options.force_refresh {
            // Read under the lock, never holding it across an await.
            let hit = {
                let mut cache = self.cache.lock().expect("fetch cache mutex poisoned");
                cache.cache_get(&key).map(|entry| entry.value.clone())
            };
            if let Some(value) = hit {
                if let Some(suppressed) = throttled("fetch.cache.hit", CACHE_HIT_LOG_WINDOW) {
                    debug!(
                        cache_key = key.as_str(),
                        suppressed, "fetch served from cache"
                    );
                }
                return Ok(Fetched {
                    value,
                    was_cached: true,
                });
            }
        }

        let client = self.session.clone().authenticated_client().await;
        let value = client
            .get_json_with_headers(url, &options.headers)
            .await
            .map_err(|failure| failure.message)?;

        if !options.skip_cache {
            let entry = CacheEntry {
                value: value.clone(),
                expires_at: options.cache_expiry.map(|ttl| Instant::now() + ttl),
            };
            self.cache
                .lock()
                .expect("fetch cache mutex poisoned")
                .cache_set(key, entry);
        }

        Ok(Fetched {
            value,
            was_cached: false,
        })
    }

    /// Force a fresh network call for `url`, ignoring any cached value.
    pub async fn refetch(&self, url: &str, options: &FetchOptions) -> Result<Fetched, String> {
        let mut options = options.clone();
        options.force_refresh = true;
        self.fetch(url, &options).await
    }

    /// Evict a single key from the shared cache.
    pub fn clear_cache(&self, key: &str) {
        self.cache
            .lock()
            .expect("fetch cache mutex poisoned")
            .cache_remove(&key.to_string());
    }
}
