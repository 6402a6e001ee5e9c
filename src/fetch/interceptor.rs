//! Cache-first fetch interceptor.
//!
//! Per request: a cache hit is served verbatim; a miss makes one network
//! attempt and stores a copy of a cacheable response. When the network
//! fails or times out, page navigations get the cached start page.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, warn};

use super::{fetch_with_timeout, Request, Response};
use crate::cache::CacheStore;
use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::platform::Network;

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    /// Cached start page served to an offline navigation
    OfflineFallback,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Cache => "cache",
            ResponseSource::Network => "network",
            ResponseSource::OfflineFallback => "offline_fallback",
        }
    }
}

/// Result of intercepting one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not handled; the platform performs its default fetch
    Passthrough,
    Respond {
        response: Response,
        source: ResponseSource,
    },
}

impl FetchOutcome {
    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            FetchOutcome::Passthrough => None,
            FetchOutcome::Respond { source, .. } => Some(*source),
        }
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Passthrough => None,
            FetchOutcome::Respond { response, .. } => Some(response),
        }
    }
}

/// Routes requests between the cache store and the network.
pub struct FetchInterceptor {
    cache: Arc<CacheStore>,
    network: Arc<dyn Network>,
    config: Arc<WorkerConfig>,
}

impl std::fmt::Debug for FetchInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchInterceptor")
            .field("cache", &self.cache)
            .field("timeout", &self.config.fetch_timeout)
            .finish_non_exhaustive()
    }
}

impl FetchInterceptor {
    pub fn new(cache: Arc<CacheStore>, network: Arc<dyn Network>, config: Arc<WorkerConfig>) -> Self {
        Self {
            cache,
            network,
            config,
        }
    }

    /// GET requests to the app origin or an allow-listed origin.
    pub fn should_intercept(&self, request: &Request) -> bool {
        request.is_get() && self.config.is_allowed_origin(&request.url)
    }

    pub async fn handle(&self, request: &Request) -> Result<FetchOutcome> {
        if !self.should_intercept(request) {
            debug!(method = %request.method, url = %request.url, "passing request through");
            return Ok(FetchOutcome::Passthrough);
        }

        if let Some(response) = self.cache.lookup(request).await? {
            return Ok(FetchOutcome::Respond {
                response,
                source: ResponseSource::Cache,
            });
        }

        match fetch_with_timeout(self.network.as_ref(), request, self.config.fetch_timeout).await {
            Ok(response) => {
                if let Err(e) = self.cache.store(request, &response).await {
                    warn!("Failed to cache {}: {}", request.url, e);
                }
                Ok(FetchOutcome::Respond {
                    response,
                    source: ResponseSource::Network,
                })
            }
            Err(e) if e.is_network_failure() => {
                error!("Fetch failed: {}", e);
                if request.is_navigation() {
                    if let Some(response) = self.offline_page().await? {
                        return Ok(FetchOutcome::Respond {
                            response,
                            source: ResponseSource::OfflineFallback,
                        });
                    }
                    warn!("No cached start page for offline navigation to {}", request.url);
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// The cached start page, if any.
    async fn offline_page(&self) -> Result<Option<Response>> {
        let url = self.config.resolve(&self.config.start_page).ok_or_else(|| {
            WorkerError::Internal(format!("unresolvable start page '{}'", self.config.start_page))
        })?;
        let request = Request::get(url.as_str())?;
        self.cache.lookup(&request).await
    }
}
