//! Fetch Module
//!
//! Request/response values and the cache-first interceptor.

mod interceptor;
mod request;

pub use interceptor::{FetchInterceptor, FetchOutcome, ResponseSource};
pub use request::{Request, RequestMode, Response, ResponseType};

use std::time::Duration;

use crate::error::{Result, WorkerError};
use crate::platform::Network;

/// Runs one network attempt, failing with [`WorkerError::Timeout`] after `limit`.
pub async fn fetch_with_timeout(
    network: &dyn Network,
    request: &Request,
    limit: Duration,
) -> Result<Response> {
    match tokio::time::timeout(limit, network.fetch(request)).await {
        Ok(result) => result,
        Err(_) => Err(WorkerError::Timeout {
            url: request.url.to_string(),
            after_ms: limit.as_millis() as u64,
        }),
    }
}
