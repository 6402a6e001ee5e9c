//! Network port backed by reqwest.
//!
//! Requests addressed to the application origin are forwarded to the upstream
//! origin that actually serves the pages; cross-origin requests go out as-is.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::Network;
use crate::error::{Result, WorkerError};
use crate::fetch::{Request, Response, ResponseType};

/// HTTP client that serves the app origin from an upstream server.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: reqwest::Client,
    app_origin: Url,
    upstream: Url,
}

impl HttpNetwork {
    pub fn new(app_origin: Url, upstream: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            app_origin,
            upstream,
        }
    }

    /// Maps an app-origin URL onto the upstream origin.
    fn to_upstream(&self, url: &Url) -> Url {
        if url.origin() != self.app_origin.origin() {
            return url.clone();
        }
        let mut target = self.upstream.clone();
        target.set_path(url.path());
        target.set_query(url.query());
        target
    }

    /// Maps an upstream URL back onto the app origin.
    fn to_app(&self, url: &Url) -> Url {
        if url.origin() != self.upstream.origin() {
            return url.clone();
        }
        let mut target = self.app_origin.clone();
        target.set_path(url.path());
        target.set_query(url.query());
        target
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let target = self.to_upstream(&request.url);
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| WorkerError::InvalidRequest(format!("bad method '{}': {}", request.method, e)))?;

        let mut builder = self.client.request(method, target.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| WorkerError::Network(format!("{}: {}", request.url, e)))?;

        let status = resp.status().as_u16();
        let redirected = resp.url() != &target;
        let final_url = self.to_app(resp.url());
        let kind = if final_url.origin() == self.app_origin.origin() {
            ResponseType::Basic
        } else {
            ResponseType::Cors
        };
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = resp
            .bytes()
            .await
            .map_err(|e| WorkerError::Network(format!("{}: {}", request.url, e)))?
            .to_vec();

        debug!(url = %request.url, status, "network fetch complete");

        Ok(Response {
            url: final_url,
            status,
            kind,
            redirected,
            headers,
            body,
        })
    }
}
