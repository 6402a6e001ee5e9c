//! Platform Ports
//!
//! Async traits for the primitives the worker consumes from its host: named
//! cache buckets, the network, system notifications and application windows.
//! Components take these as `Arc<dyn ...>` so each one can be driven with
//! in-memory fakes.
//!
//! # Implementations
//! - [`MemoryCacheStorage`], [`NotificationCenter`], [`WindowRegistry`]: in-memory
//! - [`HttpNetwork`]: reqwest client forwarding to an upstream origin

mod http;
mod memory;

pub use http::HttpNetwork;
pub use memory::{MemoryCacheStorage, NotificationCenter, WindowCall, WindowRegistry};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::ResourceEntry;
use crate::error::Result;
use crate::fetch::{Request, Response};
use crate::notification::NotificationDescriptor;

/// Named cache buckets (the platform's cache storage).
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Creates the bucket if missing.
    async fn open(&self, bucket: &str) -> Result<()>;

    /// Names of all existing buckets.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Removes a bucket and everything in it. Returns false if it did not exist.
    async fn delete(&self, bucket: &str) -> Result<bool>;

    /// Looks up an entry by request URL.
    async fn match_entry(&self, bucket: &str, url: &str) -> Result<Option<ResourceEntry>>;

    /// Inserts or overwrites an entry, creating the bucket if needed.
    async fn put(&self, bucket: &str, entry: ResourceEntry) -> Result<()>;

    /// Number of entries in a bucket (0 if missing).
    async fn len(&self, bucket: &str) -> Result<usize>;
}

/// A single network attempt.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// System notification display.
#[async_trait]
pub trait NotificationDisplay: Send + Sync {
    /// Shows a notification, replacing any with the same tag.
    async fn show(&self, descriptor: &NotificationDescriptor) -> Result<()>;

    /// Closes the notification with this tag, if shown.
    async fn close(&self, tag: &str) -> Result<()>;
}

/// Identifier of an application window.
pub type ClientId = u64;

/// An open application window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowClient {
    pub id: ClientId,
    /// Current URL of the window
    pub url: String,
    pub focused: bool,
}

/// Message posted into an application window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub action: String,
    pub data: Value,
}

impl ClientMessage {
    /// Builds the `NOTIFICATION_ACTION` message pages listen for.
    pub fn notification_action(action: impl Into<String>, data: Value) -> Self {
        Self {
            kind: "NOTIFICATION_ACTION".to_string(),
            action: action.into(),
            data,
        }
    }
}

/// Window enumeration and control.
#[async_trait]
pub trait WindowClients: Send + Sync {
    /// All window clients, in creation order.
    async fn match_all(&self) -> Result<Vec<WindowClient>>;

    async fn focus(&self, id: ClientId) -> Result<()>;

    async fn navigate(&self, id: ClientId, url: &str) -> Result<()>;

    async fn post_message(&self, id: ClientId, message: &ClientMessage) -> Result<()>;

    /// Opens a new window at `url`.
    async fn open_window(&self, url: &str) -> Result<WindowClient>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_action_message_shape() {
        let msg = ClientMessage::notification_action("start_patrol", json!({"zone": "A"}));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "NOTIFICATION_ACTION");
        assert_eq!(value["action"], "start_patrol");
        assert_eq!(value["data"]["zone"], "A");
    }
}
