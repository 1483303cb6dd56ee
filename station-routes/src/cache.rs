//! Caching layer for route responses.
//!
//! Routes between fixed points change rarely, and the same station is
//! often selected more than once in a session. Successful routes are
//! cached per (origin, destination, mode); failures are never cached so a
//! retry always reaches the service.

use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::domain::{LatLon, TransportMode};
use crate::routing::{RouteError, RouteProvider, RouteSummary};

/// Cache key: bit patterns of both coordinates plus the travel mode.
type RouteKey = ((u64, u64), (u64, u64), TransportMode);

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(10 * 60),
            max_capacity: 10_000,
        }
    }
}

/// Route provider with caching.
///
/// Wraps any `RouteProvider` and caches its successful responses.
pub struct CachedRouteClient<P> {
    inner: P,
    routes: MokaCache<RouteKey, RouteSummary>,
}

impl<P: RouteProvider> CachedRouteClient<P> {
    /// Create a new cached client.
    pub fn new(inner: P, config: &CacheConfig) -> Self {
        let routes = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, routes }
    }

    fn key(origin: LatLon, destination: LatLon, mode: TransportMode) -> RouteKey {
        (origin.key(), destination.key(), mode)
    }

    /// Access the underlying provider for requests that bypass the cache.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Get cache statistics.
    pub fn cache_entry_count(&self) -> u64 {
        self.routes.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.routes.invalidate_all();
    }
}

impl<P: RouteProvider> RouteProvider for CachedRouteClient<P> {
    async fn compute_route(
        &self,
        origin: LatLon,
        destination: LatLon,
        mode: TransportMode,
    ) -> Result<RouteSummary, RouteError> {
        let key = Self::key(origin, destination, mode);

        // Try cache first
        if let Some(cached) = self.routes.get(&key).await {
            trace!(%destination, %mode, "route cache hit");
            return Ok(cached);
        }

        let summary = self.inner.compute_route(origin, destination, mode).await?;
        self.routes.insert(key, summary.clone()).await;

        Ok(summary)
    }
}
