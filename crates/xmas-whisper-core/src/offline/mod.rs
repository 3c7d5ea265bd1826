//! Offline availability of the app shell.
//!
//! The worker follows the install -> activate -> fetch lifecycle of a
//! request interceptor:
//!
//! - **install** pre-populates a versioned named cache with the shell
//! - **activate** deletes every other cache and takes control of clients
//! - **fetch** routes navigations network-first and everything else
//!   cache-first (see [`strategy`])

mod http;
mod storage;
pub mod strategy;

pub use http::HttpFetcher;
pub use storage::{MemoryCacheStorage, SqliteCacheStorage};
pub use strategy::{cache_first, network_first, Strategy};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::error::{OfflineError, StorageError};
use crate::storage::OfflineConfig;

/// Kind of outbound request, which decides the caching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    /// Loading the document itself.
    Navigate,
    /// Images, styles, scripts and everything else.
    Asset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub mode: RequestMode,
}

impl Request {
    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mode: RequestMode::Navigate,
        }
    }

    pub fn asset(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mode: RequestMode::Asset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn ok(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.to_string()),
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Live network access. An HTTP error status is still a response;
/// only transport failures are errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, OfflineError>;
}

/// Durable named response caches.
pub trait CacheStorage: Send + Sync {
    /// Names of every cache that exists.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
    fn put(&self, cache_name: &str, url: &str, response: &Response) -> Result<(), StorageError>;
    /// Look up `url` in one cache.
    fn match_in(&self, cache_name: &str, url: &str) -> Result<Option<Response>, StorageError>;
    /// Look up `url` across all caches, in name order.
    fn match_any(&self, url: &str) -> Result<Option<Response>, StorageError> {
        for name in self.keys()? {
            if let Some(resp) = self.match_in(&name, url)? {
                return Ok(Some(resp));
            }
        }
        Ok(None)
    }
    /// Returns whether the cache existed.
    fn delete(&self, cache_name: &str) -> Result<bool, StorageError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerPhase {
    Parsed,
    Installed,
    Activated,
}

/// The request interceptor for one cache version.
pub struct OfflineWorker {
    cache_name: String,
    shell: Vec<String>,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    phase: Mutex<WorkerPhase>,
    controls_clients: AtomicBool,
}

impl OfflineWorker {
    /// Resolve the shell entries against the configured origin.
    pub fn new(
        config: &OfflineConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, OfflineError> {
        let origin =
            Url::parse(&config.origin).map_err(|_| OfflineError::InvalidUrl(config.origin.clone()))?;
        let shell = config
            .shell
            .iter()
            .map(|entry| {
                origin
                    .join(entry)
                    .map(String::from)
                    .map_err(|_| OfflineError::InvalidUrl(entry.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            cache_name: config.cache_name.clone(),
            shell,
            storage,
            fetcher,
            phase: Mutex::new(WorkerPhase::Parsed),
            controls_clients: AtomicBool::new(false),
        })
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn shell(&self) -> &[String] {
        &self.shell
    }

    pub fn phase(&self) -> WorkerPhase {
        *self.phase.lock()
    }

    pub fn controls_clients(&self) -> bool {
        self.controls_clients.load(Ordering::SeqCst)
    }

    /// Fetch the whole shell and store it. All-or-nothing: if any entry
    /// fails or comes back with an error status, nothing is stored.
    pub async fn install(&self) -> Result<usize, OfflineError> {
        let mut fetched = Vec::with_capacity(self.shell.len());
        for url in &self.shell {
            let resp = self.fetcher.fetch(&Request::asset(url.clone())).await?;
            if !resp.is_ok() {
                return Err(OfflineError::FetchFailed {
                    url: url.clone(),
                    message: format!("HTTP {}", resp.status),
                });
            }
            fetched.push((url, resp));
        }
        for (url, resp) in &fetched {
            self.storage.put(&self.cache_name, url, resp)?;
        }

        *self.phase.lock() = WorkerPhase::Installed;
        info!(cache = %self.cache_name, entries = fetched.len(), "offline shell installed");
        Ok(fetched.len())
    }

    /// Drop every cache from older versions and claim open clients.
    /// Returns the names of the deleted caches.
    pub fn activate(&self) -> Result<Vec<String>, OfflineError> {
        let mut deleted = Vec::new();
        for name in self.storage.keys()? {
            if name != self.cache_name && self.storage.delete(&name)? {
                deleted.push(name);
            }
        }
        *self.phase.lock() = WorkerPhase::Activated;
        self.controls_clients.store(true, Ordering::SeqCst);
        info!(cache = %self.cache_name, stale = deleted.len(), "offline worker activated");
        Ok(deleted)
    }

    /// Install, then activate without waiting for old clients to close.
    pub async fn start(&self) -> Result<Vec<String>, OfflineError> {
        self.install().await?;
        self.activate()
    }

    /// Answer one intercepted request.
    pub async fn handle_fetch(&self, request: &Request) -> Result<Response, OfflineError> {
        match Strategy::for_mode(request.mode) {
            Strategy::NetworkFirst => {
                network_first(
                    self.storage.as_ref(),
                    &self.cache_name,
                    self.fetcher.as_ref(),
                    request,
                )
                .await
            }
            Strategy::CacheFirst => {
                cache_first(self.storage.as_ref(), self.fetcher.as_ref(), request).await
            }
        }
    }
}
