//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::{Result, WorkerError};
use crate::fetch::{Request, Response, ResponseType};
use crate::platform::Network;

/// Network that answers from a fixed route table.
///
/// Unknown URLs fail like an unreachable host.
#[derive(Debug, Default)]
pub struct FakeNetwork {
    routes: HashMap<String, Response>,
    delay: Option<Duration>,
    requested: Mutex<Vec<String>>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    fn route(mut self, url: &str, status: u16, kind: ResponseType, body: &str) -> Self {
        let parsed = Url::parse(url).unwrap();
        self.routes.insert(
            parsed.to_string(),
            Response::with_status(parsed, status, kind, body),
        );
        self
    }

    pub fn serve(self, url: &str, body: &str) -> Self {
        self.route(url, 200, ResponseType::Basic, body)
    }

    pub fn serve_cors(self, url: &str, body: &str) -> Self {
        self.route(url, 200, ResponseType::Cors, body)
    }

    pub fn serve_opaque(self, url: &str) -> Self {
        self.route(url, 200, ResponseType::Opaque, "")
    }

    pub fn status(self, url: &str, status: u16) -> Self {
        self.route(url, status, ResponseType::Basic, "")
    }

    /// Makes every fetch sleep before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs fetched so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        self.requested.lock().unwrap().push(request.url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.routes
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| WorkerError::Network(format!("{}: connection refused", request.url)))
    }
}
