//! Resource Entry Module
//!
//! Defines the structure for individual cached resources.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::fetch::{Request, Response, ResponseType};

// == Resource Entry ==
/// A cached response keyed by its request URL.
///
/// Entries carry no expiry; they live until their bucket is rotated out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceEntry {
    /// Absolute request URL (the cache key)
    pub url: String,
    /// HTTP status of the stored response
    pub status: u16,
    /// Response classification at store time
    pub kind: ResponseType,
    /// Response headers
    pub headers: Vec<(String, String)>,
    /// Response bytes
    #[serde(skip)]
    pub body: Vec<u8>,
    /// Store timestamp (Unix milliseconds)
    pub stored_at: u64,
}

impl ResourceEntry {
    // == Constructor ==
    /// Creates an entry for `request` holding a copy of `response`.
    pub fn new(request: &Request, response: &Response) -> Self {
        Self {
            url: request.cache_key().to_string(),
            status: response.status,
            kind: response.kind,
            headers: response.headers.clone(),
            body: response.body.clone(),
            stored_at: current_timestamp_ms(),
        }
    }

    /// Size of the stored body in bytes.
    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// Milliseconds since the entry was stored.
    pub fn age_ms(&self) -> u64 {
        current_timestamp_ms().saturating_sub(self.stored_at)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
