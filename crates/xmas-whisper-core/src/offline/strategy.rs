//! The two fetch algorithms, as free functions over the cache and network ports.

use tracing::{debug, warn};

use super::{CacheStorage, Fetcher, Request, RequestMode, Response};
use crate::error::OfflineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NetworkFirst,
    CacheFirst,
}

impl Strategy {
    pub fn for_mode(mode: RequestMode) -> Self {
        match mode {
            RequestMode::Navigate => Strategy::NetworkFirst,
            RequestMode::Asset => Strategy::CacheFirst,
        }
    }
}

fn cached(cache: &dyn CacheStorage, url: &str) -> Option<Response> {
    match cache.match_any(url) {
        Ok(found) => found,
        Err(e) => {
            warn!(%url, error = %e, "cache lookup failed, treating as miss");
            None
        }
    }
}

/// Live fetch, storing a copy in `cache_name`; on network failure, the cached copy.
pub async fn network_first(
    cache: &dyn CacheStorage,
    cache_name: &str,
    fetcher: &dyn Fetcher,
    request: &Request,
) -> Result<Response, OfflineError> {
    match fetcher.fetch(request).await {
        Ok(resp) => {
            if let Err(e) = cache.put(cache_name, &request.url, &resp) {
                warn!(url = %request.url, error = %e, "failed to refresh cached navigation");
            }
            Ok(resp)
        }
        Err(e) => {
            debug!(url = %request.url, error = %e, "network failed, falling back to cache");
            cached(cache, &request.url).ok_or_else(|| OfflineError::NetworkUnavailable {
                url: request.url.clone(),
            })
        }
    }
}

/// Cached copy if any, otherwise a live fetch that is not stored.
pub async fn cache_first(
    cache: &dyn CacheStorage,
    fetcher: &dyn Fetcher,
    request: &Request,
) -> Result<Response, OfflineError> {
    if let Some(resp) = cached(cache, &request.url) {
        return Ok(resp);
    }
    fetcher.fetch(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::MemoryCacheStorage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeNetwork {
        online: bool,
        calls: AtomicUsize,
    }

    impl FakeNetwork {
        fn new(online: bool) -> Self {
            Self {
                online,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Fetcher for FakeNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, OfflineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.online {
                Ok(Response::ok("text/html", format!("live {}", request.url)))
            } else {
                Err(OfflineError::FetchFailed {
                    url: request.url.clone(),
                    message: "offline".into(),
                })
            }
        }
    }

    const URL: &str = "http://localhost:3000/";

    #[test]
    fn strategy_by_mode() {
        assert_eq!(Strategy::for_mode(RequestMode::Navigate), Strategy::NetworkFirst);
        assert_eq!(Strategy::for_mode(RequestMode::Asset), Strategy::CacheFirst);
    }

    #[tokio::test]
    async fn network_first_refreshes_cache() {
        let cache = MemoryCacheStorage::new();
        let net = FakeNetwork::new(true);
        let resp = network_first(&cache, "v2", &net, &Request::navigate(URL)).await.unwrap();
        assert_eq!(resp.body, format!("live {URL}").into_bytes());
        assert_eq!(cache.match_in("v2", URL).unwrap(), Some(resp));
    }

    #[tokio::test]
    async fn network_first_falls_back_when_offline() {
        let cache = MemoryCacheStorage::new();
        cache.put("v2", URL, &Response::ok("text/html", "cached shell")).unwrap();
        let net = FakeNetwork::new(false);
        let resp = network_first(&cache, "v2", &net, &Request::navigate(URL)).await.unwrap();
        assert_eq!(resp.body, b"cached shell".to_vec());
    }

    #[tokio::test]
    async fn network_first_fails_with_nothing_cached() {
        let cache = MemoryCacheStorage::new();
        let net = FakeNetwork::new(false);
        let err = network_first(&cache, "v2", &net, &Request::navigate(URL)).await.unwrap_err();
        assert!(matches!(err, OfflineError::NetworkUnavailable { .. }));
    }

    #[tokio::test]
    async fn cache_first_skips_network_on_hit() {
        let cache = MemoryCacheStorage::new();
        cache.put("v2", "http://localhost:3000/a.png", &Response::ok("image/png", vec![1, 2])).unwrap();
        let net = FakeNetwork::new(true);
        let resp = cache_first(&cache, &net, &Request::asset("http://localhost:3000/a.png")).await.unwrap();
        assert_eq!(resp.body, vec![1, 2]);
        assert_eq!(net.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cache_first_miss_fetches_without_storing() {
        let cache = MemoryCacheStorage::new();
        let net = FakeNetwork::new(true);
        let url = "http://localhost:3000/style.css";
        cache_first(&cache, &net, &Request::asset(url)).await.unwrap();
        assert_eq!(net.calls.load(Ordering::SeqCst), 1);
        assert!(cache.match_any(url).unwrap().is_none());
    }
}
