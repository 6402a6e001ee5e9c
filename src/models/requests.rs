//! Request DTOs for the worker host API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::notification::{ClickEvent, NotificationDescriptor};

/// Request body for POST /events/notificationclick
#[derive(Debug, Clone, Deserialize)]
pub struct ClickRequest {
    /// The notification that was clicked
    pub notification: NotificationDescriptor,
    /// Button id, absent for a click on the body
    #[serde(default)]
    pub action: Option<String>,
}

impl From<ClickRequest> for ClickEvent {
    fn from(req: ClickRequest) -> Self {
        ClickEvent::new(req.notification, req.action.as_deref())
    }
}

/// Request body for POST /events/sync
#[derive(Debug, Clone, Deserialize)]
pub struct SyncRequest {
    pub tag: String,
    /// Periodic sync rather than one-off
    #[serde(default)]
    pub periodic: bool,
}

impl SyncRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.tag.trim().is_empty() {
            return Some("Sync tag cannot be empty".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_request_without_action() {
        let json = r#"{"notification": {"title": "t", "body": "b", "icon": "/i.png", "badge": "/i.png",
            "vibrate": [200], "tag": "default", "requireInteraction": false}}"#;
        let req: ClickRequest = serde_json::from_str(json).unwrap();
        assert!(req.action.is_none());

        let click: ClickEvent = req.into();
        assert_eq!(click.action(), None);
        assert_eq!(click.notification.title, "t");
    }

    #[test]
    fn test_sync_request_defaults_to_one_off() {
        let req: SyncRequest = serde_json::from_str(r#"{"tag": "background-sync"}"#).unwrap();
        assert!(!req.periodic);
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_empty_tag() {
        let req = SyncRequest {
            tag: "  ".to_string(),
            periodic: true,
        };
        assert!(req.validate().is_some());
    }
}
