//! Cache Store Module
//!
//! Versioned resource cache: one current bucket, populated from the manifest
//! at install, rotated at activation, read and written by the interceptor.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, ResourceEntry};
use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::fetch::{fetch_with_timeout, Request, Response, ResponseType};
use crate::platform::{CacheStorage, Network};

// == Reports ==
/// A manifest resource that could not be cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallFailure {
    pub url: String,
    pub reason: String,
}

/// Outcome of populating the current bucket.
///
/// Installation skips resources it cannot fetch or store; they are listed
/// in `failed` and the worker still proceeds to activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub version: String,
    pub cached: Vec<String>,
    pub failed: Vec<InstallFailure>,
}

impl InstallReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of deleting stale buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    pub version: String,
    pub deleted: Vec<String>,
}

// == Cache Store ==
/// Resource cache scoped to the configured version bucket.
pub struct CacheStore {
    /// Bucket backend
    storage: Arc<dyn CacheStorage>,
    /// Version, manifest and origin rules
    config: Arc<WorkerConfig>,
    /// Performance statistics
    stats: Mutex<CacheStats>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("version", &self.config.cache_version)
            .finish_non_exhaustive()
    }
}

impl CacheStore {
    // == Constructor ==
    pub fn new(storage: Arc<dyn CacheStorage>, config: Arc<WorkerConfig>) -> Self {
        Self {
            storage,
            config,
            stats: Mutex::new(CacheStats::new()),
        }
    }

    /// Name of the current bucket.
    pub fn version(&self) -> &str {
        &self.config.cache_version
    }

    // == Install ==
    /// Creates the current bucket and caches every manifest resource.
    ///
    /// Only a failure to open the bucket is an error. Individual resources
    /// that fail are logged and reported.
    pub async fn install(&self, network: &dyn Network) -> Result<InstallReport> {
        let version = self.version().to_string();
        self.storage.open(&version).await?;
        info!("Opened cache bucket {}", version);

        let mut report = InstallReport {
            version,
            ..InstallReport::default()
        };

        for path in &self.config.manifest {
            let request = match self
                .config
                .resolve(path)
                .ok_or_else(|| WorkerError::InvalidRequest(format!("unresolvable manifest entry '{}'", path)))
                .and_then(|url| Request::get(url.as_str()))
            {
                Ok(request) => request,
                Err(e) => {
                    warn!("Skipping manifest entry {}: {}", path, e);
                    report.failed.push(InstallFailure {
                        url: path.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let outcome = match fetch_with_timeout(network, &request, self.config.fetch_timeout).await {
                Ok(response) => match self.store(&request, &response).await {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(format!(
                        "not cacheable (status {}, {:?})",
                        response.status, response.kind
                    )),
                    Err(e) => Err(e.to_string()),
                },
                Err(e) => Err(e.to_string()),
            };

            match outcome {
                Ok(()) => report.cached.push(request.url.to_string()),
                Err(reason) => {
                    warn!("Cache install skipped {}: {}", request.url, reason);
                    report.failed.push(InstallFailure {
                        url: request.url.to_string(),
                        reason,
                    });
                }
            }
        }

        info!(
            "Cache install finished: {} cached, {} failed",
            report.cached.len(),
            report.failed.len()
        );
        Ok(report)
    }

    // == Activate ==
    /// Deletes every bucket except the current one.
    pub async fn activate(&self) -> Result<ActivateReport> {
        let mut report = ActivateReport {
            version: self.version().to_string(),
            deleted: Vec::new(),
        };

        for name in self.storage.keys().await? {
            if name == report.version {
                continue;
            }
            if self.storage.delete(&name).await? {
                info!("Deleting old cache: {}", name);
                self.stats.lock().await.record_bucket_deleted();
                report.deleted.push(name);
            }
        }

        Ok(report)
    }

    // == Lookup ==
    /// Returns the cached response for `request` from the current bucket.
    pub async fn lookup(&self, request: &Request) -> Result<Option<Response>> {
        let found = self
            .storage
            .match_entry(self.version(), request.cache_key())
            .await?;

        let mut stats = self.stats.lock().await;
        match found {
            Some(entry) => {
                stats.record_hit();
                debug!(url = %request.url, age_ms = entry.age_ms(), bytes = entry.size(), "cache hit");
                Response::from_entry(&entry).map(Some)
            }
            None => {
                stats.record_miss();
                debug!(url = %request.url, "cache miss");
                Ok(None)
            }
        }
    }

    // == Store ==
    /// Inserts or overwrites the entry for `request`.
    ///
    /// Returns false (and stores nothing) when the pair is not cacheable.
    pub async fn store(&self, request: &Request, response: &Response) -> Result<bool> {
        if !self.is_cacheable(request, response) {
            self.stats.lock().await.record_rejection();
            debug!(url = %request.url, status = response.status, "response not cacheable");
            return Ok(false);
        }

        let entry = ResourceEntry::new(request, response);
        self.storage.put(self.version(), entry).await?;
        self.stats.lock().await.record_store();
        Ok(true)
    }

    /// GET, allowed origin, status 200, readable, and not redirected off-origin.
    pub fn is_cacheable(&self, request: &Request, response: &Response) -> bool {
        request.is_get()
            && self.config.is_allowed_origin(&request.url)
            && response.status == 200
            && matches!(response.kind, ResponseType::Basic | ResponseType::Cors)
            && !(response.redirected && response.url.origin() != request.url.origin())
    }

    // == Stats ==
    /// Returns current statistics, with the entry count read from storage.
    pub async fn stats(&self) -> Result<CacheStats> {
        let total = self.storage.len(self.version()).await?;
        let mut stats = self.stats.lock().await.clone();
        stats.set_total_entries(total);
        Ok(stats)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryCacheStorage;
    use crate::testing::FakeNetwork;
    use url::Url;

    fn config() -> Arc<WorkerConfig> {
        Arc::new(WorkerConfig {
            manifest: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/app.js".to_string(),
                "https://cdn.tailwindcss.com".to_string(),
            ],
            ..WorkerConfig::default()
        })
    }

    fn store_with(storage: Arc<MemoryCacheStorage>) -> CacheStore {
        CacheStore::new(storage, config())
    }

    fn ok(url: &str, body: &str) -> Response {
        Response::ok(Url::parse(url).unwrap(), ResponseType::Basic, body)
    }

    #[tokio::test]
    async fn test_install_caches_manifest() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let store = store_with(storage.clone());
        let network = FakeNetwork::new()
            .serve("http://localhost:3000/", "home")
            .serve("http://localhost:3000/index.html", "index")
            .serve("http://localhost:3000/app.js", "js")
            .serve_cors("https://cdn.tailwindcss.com/", "css");

        let report = store.install(&network).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.cached.len(), 4);
        assert_eq!(storage.len(store.version()).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_install_skips_unreachable_resources() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let store = store_with(storage.clone());
        let network = FakeNetwork::new()
            .serve("http://localhost:3000/", "home")
            .serve("http://localhost:3000/index.html", "index")
            .status("http://localhost:3000/app.js", 404);

        let report = store.install(&network).await.unwrap();

        assert_eq!(report.cached.len(), 2);
        assert_eq!(report.failed.len(), 2);
        assert!(report.failed.iter().any(|f| f.url == "http://localhost:3000/app.js"));
        assert!(report
            .failed
            .iter()
            .any(|f| f.url == "https://cdn.tailwindcss.com/"));
        assert_eq!(storage.keys().await.unwrap(), vec![store.version().to_string()]);
    }

    #[tokio::test]
    async fn test_activate_keeps_only_current_bucket() {
        let storage = Arc::new(MemoryCacheStorage::new());
        storage.open("security-companion-v0.9.0").await.unwrap();
        storage.open("legacy").await.unwrap();
        let store = store_with(storage.clone());
        store.install(&FakeNetwork::new()).await.unwrap();

        let report = store.activate().await.unwrap();

        assert_eq!(report.deleted.len(), 2);
        assert_eq!(storage.keys().await.unwrap(), vec![store.version().to_string()]);
        assert_eq!(store.stats().await.unwrap().buckets_deleted, 2);
    }

    #[tokio::test]
    async fn test_activate_with_nothing_to_delete() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let store = store_with(storage.clone());

        let report = store.activate().await.unwrap();
        assert!(report.deleted.is_empty());
    }

    #[tokio::test]
    async fn test_store_then_lookup() {
        let store = store_with(Arc::new(MemoryCacheStorage::new()));
        let request = Request::get("http://localhost:3000/shift.html").unwrap();

        assert!(store.lookup(&request).await.unwrap().is_none());
        assert!(store
            .store(&request, &ok("http://localhost:3000/shift.html", "v1"))
            .await
            .unwrap());
        assert!(store
            .store(&request, &ok("http://localhost:3000/shift.html", "v2"))
            .await
            .unwrap());

        let cached = store.lookup(&request).await.unwrap().unwrap();
        assert_eq!(cached.body, b"v2".to_vec());

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.stores, 2);
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test]
    async fn test_store_rejects_non_cacheable() {
        let store = store_with(Arc::new(MemoryCacheStorage::new()));
        let url = "http://localhost:3000/api/report";

        let post = Request::new("POST", url).unwrap();
        assert!(!store.store(&post, &ok(url, "x")).await.unwrap());

        let get = Request::get(url).unwrap();
        let not_found = Response::with_status(Url::parse(url).unwrap(), 404, ResponseType::Basic, "");
        assert!(!store.store(&get, &not_found).await.unwrap());

        let opaque = Response::ok(Url::parse(url).unwrap(), ResponseType::Opaque, "");
        assert!(!store.store(&get, &opaque).await.unwrap());

        let mut redirected = ok("https://login.example.com/", "");
        redirected.redirected = true;
        assert!(!store.store(&get, &redirected).await.unwrap());

        let foreign = Request::get("https://tracker.example.com/p.gif").unwrap();
        assert!(!store.store(&foreign, &ok("https://tracker.example.com/p.gif", "")).await.unwrap());

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.rejected, 5);
        assert_eq!(stats.total_entries, 0);
    }

    #[tokio::test]
    async fn test_same_origin_redirect_is_cacheable() {
        let store = store_with(Arc::new(MemoryCacheStorage::new()));
        let request = Request::get("http://localhost:3000/").unwrap();
        let mut response = ok("http://localhost:3000/index.html", "home");
        response.redirected = true;

        assert!(store.is_cacheable(&request, &response));
    }
}
