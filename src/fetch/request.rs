//! Request and response values seen by the interceptor.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::ResourceEntry;
use crate::error::{Result, WorkerError};

// == Request Mode ==
/// Why the page issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Full page load
    Navigate,
    SameOrigin,
    #[default]
    NoCors,
    Cors,
}

impl RequestMode {
    /// Maps a `Sec-Fetch-Mode` header value onto a mode.
    pub fn from_header(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "navigate" => RequestMode::Navigate,
            "same-origin" => RequestMode::SameOrigin,
            "cors" => RequestMode::Cors,
            _ => RequestMode::NoCors,
        }
    }
}

// == Request ==
/// An outgoing request from an application page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Upper-case HTTP method
    pub method: String,
    /// Absolute request URL
    pub url: Url,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    /// Creates a request with the given method for an absolute URL.
    pub fn new(method: &str, url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| WorkerError::InvalidRequest(format!("bad url '{}': {}", url, e)))?;
        Ok(Self {
            method: method.to_ascii_uppercase(),
            url,
            mode: RequestMode::default(),
            headers: Vec::new(),
            body: Vec::new(),
        })
    }

    /// Creates a GET sub-resource request.
    pub fn get(url: &str) -> Result<Self> {
        Self::new("GET", url)
    }

    /// Creates a GET page navigation.
    pub fn navigate(url: &str) -> Result<Self> {
        Ok(Self::get(url)?.with_mode(RequestMode::Navigate))
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Key used for cache lookups.
    pub fn cache_key(&self) -> &str {
        self.url.as_str()
    }
}

// == Response Type ==
/// Classification of a response, mirroring the platform's response types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response
    Basic,
    /// Readable cross-origin response
    Cors,
    /// Unreadable cross-origin response
    Opaque,
    /// Network error placeholder
    Error,
}

// == Response ==
/// A response produced by the network or the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Final URL after redirects
    pub url: Url,
    pub status: u16,
    pub kind: ResponseType,
    pub redirected: bool,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a plain 200 response for `url` with the given body.
    pub fn ok(url: Url, kind: ResponseType, body: impl Into<Vec<u8>>) -> Self {
        Self::with_status(url, 200, kind, body)
    }

    pub fn with_status(url: Url, status: u16, kind: ResponseType, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url,
            status,
            kind,
            redirected: false,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Rebuilds a response from a cached entry.
    pub fn from_entry(entry: &ResourceEntry) -> Result<Self> {
        let url = Url::parse(&entry.url)
            .map_err(|e| WorkerError::CacheStorage(format!("corrupt entry url '{}': {}", entry.url, e)))?;
        Ok(Self {
            url,
            status: entry.status,
            kind: entry.kind,
            redirected: false,
            headers: entry.headers.clone(),
            body: entry.body.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_method_is_normalized() {
        let req = Request::new("post", "http://localhost:3000/api").unwrap();
        assert_eq!(req.method, "POST");
        assert!(!req.is_get());
    }

    #[test]
    fn test_request_rejects_relative_url() {
        let result = Request::get("/index.html");
        assert!(matches!(result, Err(WorkerError::InvalidRequest(_))));
    }

    #[test]
    fn test_navigate_sets_mode() {
        let req = Request::navigate("http://localhost:3000/shift.html").unwrap();
        assert!(req.is_navigation());
        assert!(req.is_get());
    }

    #[test]
    fn test_mode_from_header() {
        assert_eq!(RequestMode::from_header("navigate"), RequestMode::Navigate);
        assert_eq!(RequestMode::from_header("Same-Origin"), RequestMode::SameOrigin);
        assert_eq!(RequestMode::from_header("cors"), RequestMode::Cors);
        assert_eq!(RequestMode::from_header("websocket"), RequestMode::NoCors);
    }
}
