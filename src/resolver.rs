//! Resolution of CRS URIs to projections
//!
//! The resolver answers from its cache when it can. On a miss it extracts
//! the EPSG code from the URI, fetches the proj4 definition from the
//! registry, and stores the parsed projection (axis-swapped for URIs on the
//! exception list) before returning it. A failed load leaves the cache
//! untouched.
//!
//! Concurrent loads of the same uncached URI each fetch, and the last one to
//! finish owns the cache slot. Enabling `deduplicate_loads` makes them wait
//! on a per-URI lock instead, so only one request is issued.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use crate::cache::{ProjectionCache, ProjectionSource, SetOptions};
use crate::config::ResolverConfig;
use crate::projection::Projection;
use crate::registry::{HttpRegistry, Registry};
use crate::uri::{parse_epsg_code, requires_axis_swap};
use crate::{CrsError, Result};

/// Per-URI locks for loads in progress
#[derive(Debug, Default)]
struct InFlight {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl InFlight {
    async fn acquire<'a>(&'a self, uri: &str) -> InFlightGuard<'a> {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            locks.entry(uri.to_string()).or_default().clone()
        };
        InFlightGuard {
            in_flight: self,
            uri: uri.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}

/// Holds the per-URI lock; drops the map entry once nobody else holds it
struct InFlightGuard<'a> {
    in_flight: &'a InFlight,
    uri: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Waiters clone the lock under the map lock, so a count of one means
        // only the map still refers to it.
        let mut locks = self.in_flight.locks.lock().unwrap();
        if locks
            .get(&self.uri)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.uri);
        }
    }
}

/// Cache-or-fetch resolver for CRS URIs
#[derive(Debug)]
pub struct Resolver<R = HttpRegistry> {
    cache: Arc<ProjectionCache>,
    registry: R,
    in_flight: Option<InFlight>,
}

impl Resolver<HttpRegistry> {
    /// Create a resolver with the default HTTP registry and a fresh cache
    pub fn new() -> Self {
        Self::from_config(&ResolverConfig::default())
    }

    /// Create a resolver from configuration
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::with_registry(HttpRegistry::new(config.registry_url.as_str()))
            .deduplicate_loads(config.deduplicate_loads)
    }
}

impl Default for Resolver<HttpRegistry> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Registry> Resolver<R> {
    /// Create a resolver with a fresh cache
    pub fn with_registry(registry: R) -> Self {
        Self::with_cache(Arc::new(ProjectionCache::new()), registry)
    }

    /// Create a resolver that shares an existing cache
    pub fn with_cache(cache: Arc<ProjectionCache>, registry: R) -> Self {
        Self {
            cache,
            registry,
            in_flight: None,
        }
    }

    /// Enable or disable per-URI deduplication of concurrent loads
    pub fn deduplicate_loads(mut self, enabled: bool) -> Self {
        self.in_flight = enabled.then(InFlight::default);
        self
    }

    /// The cache backing this resolver
    pub fn cache(&self) -> &Arc<ProjectionCache> {
        &self.cache
    }

    /// The registry definitions are fetched from
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Get a cached projection. Never fetches.
    pub fn get(&self, uri: &str) -> Option<Projection> {
        self.cache.get(uri)
    }

    /// Store a projection or definition under a URI.
    ///
    /// See [`ProjectionCache::set`].
    pub fn set(
        &self,
        uri: &str,
        source: impl Into<ProjectionSource>,
        options: SetOptions,
    ) -> Result<Projection> {
        self.cache.set(uri, source, options)
    }

    /// Resolve a URI to a projection, fetching its definition if needed.
    ///
    /// A cached URI returns without awaiting anything.
    ///
    /// # Errors
    ///
    /// - `CrsError::UnsupportedUri` if the URI is uncached and not an EPSG URI
    /// - `CrsError::Transport` if the registry could not be reached
    /// - `CrsError::Http` if the registry answered with a non-2xx status
    /// - `CrsError::Parse` if the definition could not be parsed
    pub async fn load(&self, uri: &str) -> Result<Projection> {
        if let Some(projection) = self.cache.get(uri) {
            debug!("Cache hit for {}", uri);
            return Ok(projection);
        }

        let code = parse_epsg_code(uri)?;

        let _guard = match &self.in_flight {
            Some(in_flight) => {
                let guard = in_flight.acquire(uri).await;
                // Another load may have finished while we waited.
                if let Some(projection) = self.cache.get(uri) {
                    debug!("Cache hit for {} after waiting on in-flight load", uri);
                    return Ok(projection);
                }
                Some(guard)
            }
            None => None,
        };

        let response = self.registry.fetch(code).await?;
        if !response.is_success() {
            let url = self.registry.definition_url(code);
            warn!("Registry returned HTTP {} for {}", response.status, url);
            return Err(CrsError::Http {
                status: response.status,
                url,
            });
        }

        let options = SetOptions {
            reverse_axes: requires_axis_swap(uri),
        };
        let projection = self.cache.set(uri, response.body, options)?;
        info!("Resolved {} to {}", uri, projection);
        Ok(projection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionKind;
    use crate::registry::testing::StaticRegistry;
    use crate::uri::{epsg_uri, CRS84, EPSG_4979};
    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    const BRITISH_NATIONAL_GRID: &str = "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 \
        +x_0=400000 +y_0=-100000 +ellps=airy \
        +towgs84=446.448,-125.157,542.06,0.15,0.247,0.842,-20.489 +units=m +no_defs";
    const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs";
    const UTM_32N: &str = "+proj=utm +zone=32 +datum=WGS84 +units=m +no_defs";

    fn registry() -> StaticRegistry {
        StaticRegistry::default()
            .with("27700", BRITISH_NATIONAL_GRID)
            .with("4326", WGS84)
            .with("32632", UTM_32N)
            .with("9999", "+proj=nonexistent")
    }

    fn assert_close(actual: [f64; 2], expected: [f64; 2], tolerance: f64) {
        assert!(
            (actual[0] - expected[0]).abs() <= tolerance
                && (actual[1] - expected[1]).abs() <= tolerance,
            "expected {:?} within {} of {:?}",
            actual,
            tolerance,
            expected
        );
    }

    #[tokio::test]
    async fn test_load_builtin_without_fetch() {
        let resolver = Resolver::with_registry(registry());

        let crs84 = resolver.load(CRS84).await.unwrap();
        assert_eq!(crs84.forward([-1.54, 55.5]).unwrap(), [-1.54, 55.5]);

        let latlon = resolver.load(EPSG_4979).await.unwrap();
        assert_eq!(latlon.forward([-1.54, 55.5]).unwrap(), [55.5, -1.54]);

        assert_eq!(resolver.registry().fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_load_fetches_once() {
        let resolver = Resolver::with_registry(registry());
        let uri = epsg_uri(27700);

        let first = resolver.load(&uri).await.unwrap();
        let second = resolver.load(&uri).await.unwrap();

        assert_eq!(resolver.registry().fetch_count(), 1);
        assert!(first.ptr_eq(&second));
        assert!(resolver.get(&uri).unwrap().ptr_eq(&first));
    }

    #[tokio::test]
    async fn test_load_british_national_grid() {
        let resolver = Resolver::with_registry(registry());
        let bng = resolver.load(&epsg_uri(27700)).await.unwrap();
        assert_eq!(bng.projection_kind(), ProjectionKind::Definition);

        let projected = bng.forward([-1.54, 55.5]).unwrap();
        assert_close(projected, [429158.0, 623009.0], 5.0);
        assert_close(bng.inverse(projected).unwrap(), [-1.54, 55.5], 1e-3);
    }

    #[tokio::test]
    async fn test_load_reverses_listed_axes() {
        let resolver = Resolver::with_registry(registry());
        let epsg4326 = resolver.load(&epsg_uri(4326)).await.unwrap();
        assert_eq!(epsg4326.projection_kind(), ProjectionKind::ReversedAxes);

        assert_close(epsg4326.forward([10.0, 50.0]).unwrap(), [50.0, 10.0], 1e-9);
        assert_close(epsg4326.inverse([50.0, 10.0]).unwrap(), [10.0, 50.0], 1e-9);
    }

    #[tokio::test]
    async fn test_load_unlisted_keeps_axes() {
        let resolver = Resolver::with_registry(registry());
        let utm = resolver.load(&epsg_uri(32632)).await.unwrap();
        assert_eq!(utm.projection_kind(), ProjectionKind::Definition);
    }

    #[tokio::test]
    async fn test_load_unsupported_uri() {
        let resolver = Resolver::with_registry(registry());
        let err = resolver.load("urn:ogc:def:crs:EPSG::27700").await.unwrap_err();

        assert!(matches!(err, CrsError::UnsupportedUri(ref uri) if uri == "urn:ogc:def:crs:EPSG::27700"));
        assert_eq!(resolver.registry().fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_load_http_error_leaves_cache_unchanged() {
        let resolver = Resolver::with_registry(registry());
        let uri = epsg_uri(99999999);

        match resolver.load(&uri).await {
            Err(CrsError::Http { status, url }) => {
                assert_eq!(status, 404);
                assert_eq!(url, "memory://99999999.proj4");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(resolver.get(&uri).is_none());
        assert_eq!(resolver.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_load_parse_error_leaves_cache_unchanged() {
        let resolver = Resolver::with_registry(registry());
        let uri = epsg_uri(9999);

        let err = resolver.load(&uri).await.unwrap_err();
        assert!(matches!(err, CrsError::Parse { ref definition, .. } if definition == "+proj=nonexistent"));
        assert!(resolver.get(&uri).is_none());
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let resolver = Resolver::with_registry(registry());
        let uri = epsg_uri(99999999);

        assert!(resolver.load(&uri).await.is_err());
        assert!(resolver.load(&uri).await.is_err());
        assert_eq!(resolver.registry().fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_set_then_load_skips_fetch() {
        let resolver = Resolver::with_registry(registry());
        let uri = epsg_uri(32632);

        let stored = resolver.set(&uri, UTM_32N, SetOptions::default()).unwrap();
        let loaded = resolver.load(&uri).await.unwrap();

        assert!(stored.ptr_eq(&loaded));
        assert_eq!(resolver.registry().fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_set_custom_uri() {
        let resolver = Resolver::with_registry(registry());
        resolver
            .set("urn:example:latlon", Projection::wgs84(), SetOptions::reversed())
            .unwrap();

        let latlon = resolver.load("urn:example:latlon").await.unwrap();
        assert_eq!(latlon.forward([1.0, 2.0]).unwrap(), [2.0, 1.0]);
    }

    #[tokio::test]
    async fn test_set_invalid_arguments() {
        let resolver = Resolver::with_registry(registry());
        assert!(matches!(
            resolver.set("", Projection::wgs84(), SetOptions::default()),
            Err(CrsError::InvalidArgument(_))
        ));
        assert!(matches!(
            resolver.set(&epsg_uri(27700), "", SetOptions::default()),
            Err(CrsError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_shared_cache() {
        let cache = Arc::new(ProjectionCache::new());
        let first = Resolver::with_cache(cache.clone(), registry());
        let second = Resolver::with_cache(cache.clone(), registry());
        let uri = epsg_uri(27700);

        first.load(&uri).await.unwrap();
        second.load(&uri).await.unwrap();

        assert_eq!(first.registry().fetch_count(), 1);
        assert_eq!(second.registry().fetch_count(), 0);
        assert!(cache.contains(&uri));
    }

    #[tokio::test]
    async fn test_isolated_caches() {
        let first = Resolver::with_registry(registry());
        let second = Resolver::with_registry(registry());
        let uri = epsg_uri(27700);

        first.load(&uri).await.unwrap();
        assert!(second.get(&uri).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_deduplicated_concurrent_loads() {
        let resolver = Arc::new(Resolver::with_registry(registry()).deduplicate_loads(true));
        let uri = epsg_uri(27700);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = resolver.clone();
                let uri = uri.clone();
                tokio::spawn(async move { resolver.load(&uri).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(resolver.registry().fetch_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_deduplicated_failed_loads_each_retry() {
        let resolver = Arc::new(Resolver::with_registry(registry()).deduplicate_loads(true));
        let uri = epsg_uri(99999999);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resolver = resolver.clone();
                let uri = uri.clone();
                tokio::spawn(async move { resolver.load(&uri).await })
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(matches!(result, Err(CrsError::Http { status: 404, .. })));
        }
        // Each waiter fetched again after the previous holder failed.
        assert_eq!(resolver.registry().fetch_count(), 4);
        assert!(resolver.get(&uri).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_in_flight_locks_released() {
        let resolver = Arc::new(Resolver::with_registry(registry()).deduplicate_loads(true));
        let uris = [epsg_uri(27700), epsg_uri(99999999), epsg_uri(9999)];

        let handles: Vec<_> = uris
            .iter()
            .cycle()
            .take(9)
            .map(|uri| {
                let resolver = resolver.clone();
                let uri = uri.clone();
                tokio::spawn(async move { resolver.load(&uri).await })
            })
            .collect();

        for handle in handles {
            let _ = handle.await.unwrap();
        }
        assert_eq!(resolver.in_flight.as_ref().unwrap().len(), 0);
        assert!(resolver.get(&uris[0]).is_some());
    }

    #[test]
    fn test_cached_load_ready_on_first_poll() {
        let resolver = Resolver::with_registry(registry());
        resolver
            .set("urn:example:crs", Projection::wgs84(), SetOptions::default())
            .unwrap();
        let mut cx = Context::from_waker(Waker::noop());

        for uri in [CRS84, EPSG_4979, "urn:example:crs"] {
            let mut load = pin!(resolver.load(uri));
            match load.as_mut().poll(&mut cx) {
                Poll::Ready(Ok(_)) => {}
                other => panic!("load of {} was not ready: {:?}", uri, other),
            }
        }
        assert_eq!(resolver.registry().fetch_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_loads_without_deduplication() {
        let resolver = Arc::new(Resolver::with_registry(registry()));
        let uri = epsg_uri(27700);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = resolver.clone();
                let uri = uri.clone();
                tokio::spawn(async move { resolver.load(&uri).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        // Every load fetched or hit the cache; the last writer owns the slot.
        let fetches = resolver.registry().fetch_count();
        assert!((1..=8).contains(&fetches));
        assert!(resolver.get(&uri).is_some());
    }

    #[test]
    fn test_from_config() {
        let config = ResolverConfig {
            registry_url: "http://registry.example/".to_string(),
            deduplicate_loads: true,
        };
        let resolver = Resolver::from_config(&config);
        assert_eq!(resolver.registry().base_url(), "http://registry.example");
        assert!(resolver.in_flight.is_some());
        assert!(Resolver::new().in_flight.is_none());
    }

    // ========================================================================
    // Live registry tests
    // ========================================================================

    #[tokio::test]
    #[ignore = "requires network access to epsg.io"]
    async fn test_live_british_national_grid() {
        let resolver = Resolver::new();
        let bng = resolver
            .load("http://www.opengis.net/def/crs/EPSG/0/27700")
            .await
            .unwrap();

        // Registry definitions may omit the datum shift.
        let projected = bng.forward([-1.54, 55.5]).unwrap();
        assert_close(projected, [429158.0, 623009.0], 150.0);
        assert_close(bng.inverse(projected).unwrap(), [-1.54, 55.5], 1e-3);
    }

    #[tokio::test]
    #[ignore = "requires network access to epsg.io"]
    async fn test_live_unknown_code() {
        let resolver = Resolver::new();
        let result = resolver
            .load("http://www.opengis.net/def/crs/EPSG/0/99999999")
            .await;
        assert!(matches!(result, Err(CrsError::Http { .. })));
    }
}
