//! In-memory platform primitives.
//!
//! Used by the HTTP host (which has no browser behind it) and by tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use super::{CacheStorage, ClientId, ClientMessage, NotificationDisplay, WindowClient, WindowClients};
use crate::cache::ResourceEntry;
use crate::error::{Result, WorkerError};
use crate::notification::NotificationDescriptor;

// == Cache Storage ==
/// Buckets of entries keyed by request URL.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    buckets: RwLock<BTreeMap<String, HashMap<String, ResourceEntry>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, bucket: &str) -> Result<()> {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.buckets.read().await.keys().cloned().collect())
    }

    async fn delete(&self, bucket: &str) -> Result<bool> {
        Ok(self.buckets.write().await.remove(bucket).is_some())
    }

    async fn match_entry(&self, bucket: &str, url: &str) -> Result<Option<ResourceEntry>> {
        let buckets = self.buckets.read().await;
        Ok(buckets.get(bucket).and_then(|b| b.get(url)).cloned())
    }

    async fn put(&self, bucket: &str, entry: ResourceEntry) -> Result<()> {
        let mut buckets = self.buckets.write().await;
        buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(entry.url.clone(), entry);
        Ok(())
    }

    async fn len(&self, bucket: &str) -> Result<usize> {
        Ok(self.buckets.read().await.get(bucket).map_or(0, HashMap::len))
    }
}

// == Notification Center ==
/// Currently visible notifications, one per tag.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    visible: RwLock<Vec<NotificationDescriptor>>,
    shown_total: RwLock<u64>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the visible notifications, oldest first.
    pub async fn visible(&self) -> Vec<NotificationDescriptor> {
        self.visible.read().await.clone()
    }

    /// Number of `show` calls since creation.
    pub async fn shown_total(&self) -> u64 {
        *self.shown_total.read().await
    }
}

#[async_trait]
impl NotificationDisplay for NotificationCenter {
    async fn show(&self, descriptor: &NotificationDescriptor) -> Result<()> {
        let mut visible = self.visible.write().await;
        visible.retain(|n| n.tag != descriptor.tag);
        visible.push(descriptor.clone());
        *self.shown_total.write().await += 1;
        debug!(tag = %descriptor.tag, "notification shown");
        Ok(())
    }

    async fn close(&self, tag: &str) -> Result<()> {
        self.visible.write().await.retain(|n| n.tag != tag);
        Ok(())
    }
}

// == Window Registry ==
/// A call made against the window registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum WindowCall {
    Focus { id: ClientId },
    Navigate { id: ClientId, url: String },
    PostMessage { id: ClientId, message: ClientMessage },
    Open { url: String },
}

#[derive(Debug, Default)]
struct RegistryState {
    windows: Vec<WindowClient>,
    calls: Vec<WindowCall>,
    next_id: ClientId,
}

/// Application windows plus a log of every call made against them.
#[derive(Debug, Default)]
pub struct WindowRegistry {
    state: RwLock<RegistryState>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an already-open window (not logged as a call).
    pub async fn attach(&self, url: &str) -> WindowClient {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let client = WindowClient {
            id: state.next_id,
            url: url.to_string(),
            focused: false,
        };
        state.windows.push(client.clone());
        client
    }

    pub async fn windows(&self) -> Vec<WindowClient> {
        self.state.read().await.windows.clone()
    }

    pub async fn calls(&self) -> Vec<WindowCall> {
        self.state.read().await.calls.clone()
    }
}

impl RegistryState {
    fn window_mut(&mut self, id: ClientId) -> Result<&mut WindowClient> {
        self.windows
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| WorkerError::Platform(format!("no window client {}", id)))
    }
}

#[async_trait]
impl WindowClients for WindowRegistry {
    async fn match_all(&self) -> Result<Vec<WindowClient>> {
        Ok(self.windows().await)
    }

    async fn focus(&self, id: ClientId) -> Result<()> {
        let mut state = self.state.write().await;
        state.window_mut(id)?;
        for window in state.windows.iter_mut() {
            window.focused = window.id == id;
        }
        state.calls.push(WindowCall::Focus { id });
        Ok(())
    }

    async fn navigate(&self, id: ClientId, url: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.window_mut(id)?.url = url.to_string();
        state.calls.push(WindowCall::Navigate {
            id,
            url: url.to_string(),
        });
        Ok(())
    }

    async fn post_message(&self, id: ClientId, message: &ClientMessage) -> Result<()> {
        let mut state = self.state.write().await;
        state.window_mut(id)?;
        state.calls.push(WindowCall::PostMessage {
            id,
            message: message.clone(),
        });
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<WindowClient> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        for window in state.windows.iter_mut() {
            window.focused = false;
        }
        let client = WindowClient {
            id: state.next_id,
            url: url.to_string(),
            focused: true,
        };
        state.windows.push(client.clone());
        state.calls.push(WindowCall::Open {
            url: url.to_string(),
        });
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{Request, Response, ResponseType};
    use serde_json::json;

    fn entry(url: &str, body: &str) -> ResourceEntry {
        let request = Request::get(url).unwrap();
        let response = Response::ok(request.url.clone(), ResponseType::Basic, body);
        ResourceEntry::new(&request, &response)
    }

    fn descriptor(tag: &str) -> NotificationDescriptor {
        serde_json::from_value(json!({
            "title": "t", "body": "b", "icon": "i", "badge": "b",
            "vibrate": [], "tag": tag, "requireInteraction": false
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_storage_buckets() {
        let storage = MemoryCacheStorage::new();
        storage.open("v1").await.unwrap();
        storage.put("v2", entry("http://localhost:3000/", "home")).await.unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["v1", "v2"]);
        assert_eq!(storage.len("v1").await.unwrap(), 0);
        assert_eq!(storage.len("v2").await.unwrap(), 1);

        assert!(storage.delete("v1").await.unwrap());
        assert!(!storage.delete("v1").await.unwrap());
        assert_eq!(storage.keys().await.unwrap(), vec!["v2"]);
    }

    #[tokio::test]
    async fn test_storage_put_overwrites() {
        let storage = MemoryCacheStorage::new();
        storage.put("v1", entry("http://localhost:3000/a", "one")).await.unwrap();
        storage.put("v1", entry("http://localhost:3000/a", "two")).await.unwrap();

        let found = storage
            .match_entry("v1", "http://localhost:3000/a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.body, b"two".to_vec());
        assert_eq!(storage.len("v1").await.unwrap(), 1);
        assert!(storage.match_entry("v0", "http://localhost:3000/a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_notification_center_replaces_same_tag() {
        let center = NotificationCenter::new();
        center.show(&descriptor("patrol")).await.unwrap();
        center.show(&descriptor("patrol")).await.unwrap();
        center.show(&descriptor("shift")).await.unwrap();

        assert_eq!(center.visible().await.len(), 2);
        assert_eq!(center.shown_total().await, 3);

        center.close("patrol").await.unwrap();
        let visible = center.visible().await;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].tag, "shift");
    }

    #[tokio::test]
    async fn test_window_registry_logs_calls() {
        let registry = WindowRegistry::new();
        let existing = registry.attach("http://localhost:3000/").await;
        assert!(registry.calls().await.is_empty());

        registry.focus(existing.id).await.unwrap();
        registry
            .navigate(existing.id, "http://localhost:3000/shift.html")
            .await
            .unwrap();
        let opened = registry.open_window("http://localhost:3000/radio.html").await.unwrap();

        let windows = registry.windows().await;
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].url, "http://localhost:3000/shift.html");
        assert!(!windows[0].focused);
        assert!(windows[1].focused);
        assert_ne!(opened.id, existing.id);
        assert_eq!(registry.calls().await.len(), 3);
    }

    #[tokio::test]
    async fn test_window_registry_unknown_client() {
        let registry = WindowRegistry::new();
        let result = registry.focus(42).await;
        assert!(matches!(result, Err(WorkerError::Platform(_))));
    }
}
