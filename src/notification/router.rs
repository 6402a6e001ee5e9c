//! Notification click routing.
//!
//! Every click closes its notification, then resolves to at most one window
//! operation: post a message into an existing window, focus and navigate an
//! existing window, or open a new one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::NotificationDescriptor;
use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::platform::{ClientId, ClientMessage, NotificationDisplay, WindowClient, WindowClients};

/// Action ids handled by the router.
pub mod actions {
    pub const OPEN: &str = "open";
    pub const DISMISS: &str = "dismiss";
    pub const EXPLORE: &str = "explore";
    pub const CLOSE: &str = "close";
    pub const VIEW: &str = "view";
    pub const RESPOND: &str = "respond";
    pub const LOCATION: &str = "location";
    pub const START_PATROL: &str = "start_patrol";
    pub const CREATE_INCIDENT: &str = "create_incident";
}

/// A click on a notification body or one of its buttons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub notification: NotificationDescriptor,
    /// Button id; absent or empty for a click on the body
    #[serde(default)]
    pub action: Option<String>,
}

impl ClickEvent {
    pub fn new(notification: NotificationDescriptor, action: Option<&str>) -> Self {
        Self {
            notification,
            action: action.map(str::to_string),
        }
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref().filter(|a| !a.is_empty())
    }
}

/// What the router did with a click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RouteOutcome {
    /// Closed without navigating
    Dismissed,
    /// Posted a `NOTIFICATION_ACTION` message to an open window
    Messaged { client_id: ClientId, action: String },
    /// Focused an open window and navigated it
    Focused { client_id: ClientId, url: String },
    /// Opened a new window
    Opened { client_id: ClientId, url: String },
}

/// Dispatches notification clicks to application windows.
pub struct NotificationRouter {
    display: Arc<dyn NotificationDisplay>,
    clients: Arc<dyn WindowClients>,
    config: Arc<WorkerConfig>,
}

impl std::fmt::Debug for NotificationRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationRouter")
            .field("mission", &self.config.mission)
            .finish_non_exhaustive()
    }
}

impl NotificationRouter {
    pub fn new(
        display: Arc<dyn NotificationDisplay>,
        clients: Arc<dyn WindowClients>,
        config: Arc<WorkerConfig>,
    ) -> Self {
        Self {
            display,
            clients,
            config,
        }
    }

    pub async fn route(&self, click: &ClickEvent) -> Result<RouteOutcome> {
        let notification = &click.notification;
        if let Err(e) = self.display.close(&notification.tag).await {
            warn!("Failed to close notification {}: {}", notification.tag, e);
        }

        let action = click.action();
        debug!(tag = %notification.tag, action = ?action, "notification clicked");

        if notification.tag == self.config.mission.tag {
            if let Some(deep_link) = action.and_then(|a| self.mission_link(a)) {
                let action = action.unwrap_or_default().to_string();
                return self.route_mission(action, deep_link, notification).await;
            }
        }

        if matches!(action, Some(actions::DISMISS) | Some(actions::CLOSE)) {
            return Ok(RouteOutcome::Dismissed);
        }

        let target = self.target_path(action, notification);
        let url = self.resolve(&target)?;
        self.focus_or_open(url).await
    }

    /// Deep link for a persistent-mission action.
    fn mission_link(&self, action: &str) -> Option<&str> {
        match action {
            actions::START_PATROL => Some(self.config.mission.start_patrol_url.as_str()),
            actions::CREATE_INCIDENT => Some(self.config.mission.create_incident_url.as_str()),
            _ => None,
        }
    }

    async fn route_mission(
        &self,
        action: String,
        deep_link: &str,
        notification: &NotificationDescriptor,
    ) -> Result<RouteOutcome> {
        let app_origin = self.config.app_origin.clone();
        if let Some(client) = self.find_window(&app_origin).await? {
            let message = ClientMessage::notification_action(action.clone(), notification.data.clone());
            self.clients.focus(client.id).await?;
            self.clients.post_message(client.id, &message).await?;
            info!("Sent {} to window {}", action, client.id);
            return Ok(RouteOutcome::Messaged {
                client_id: client.id,
                action,
            });
        }

        let url = self.resolve(deep_link)?;
        let opened = self.clients.open_window(url.as_str()).await?;
        info!("Opened {} for {}", url, action);
        Ok(RouteOutcome::Opened {
            client_id: opened.id,
            url: url.to_string(),
        })
    }

    /// Page a click should land on, relative to the app origin.
    fn target_path(&self, action: Option<&str>, notification: &NotificationDescriptor) -> String {
        let data = &notification.data;
        match action {
            Some(actions::RESPOND) if notification.data_type() == Some("emergency") => {
                if let Some(id) = data.get("id").and_then(scalar) {
                    return format!("/emergency.html?id={}", id);
                }
            }
            Some(actions::LOCATION) => {
                let location = data.get("location");
                let lat = location.and_then(|l| l.get("lat")).and_then(scalar);
                let lng = location.and_then(|l| l.get("lng")).and_then(scalar);
                if let (Some(lat), Some(lng)) = (lat, lng) {
                    return format!("/location.html?lat={}&lng={}", lat, lng);
                }
            }
            _ => {}
        }
        notification
            .data_url()
            .filter(|u| !u.is_empty())
            .unwrap_or("/")
            .to_string()
    }

    fn resolve(&self, target: &str) -> Result<Url> {
        self.config
            .resolve(target)
            .ok_or_else(|| WorkerError::InvalidRequest(format!("unresolvable target '{}'", target)))
    }

    /// An open window on `origin`, preferring the focused one.
    async fn find_window(&self, target: &Url) -> Result<Option<WindowClient>> {
        let origin = target.origin();
        let mut candidates: Vec<WindowClient> = self
            .clients
            .match_all()
            .await?
            .into_iter()
            .filter(|c| Url::parse(&c.url).map(|u| u.origin() == origin).unwrap_or(false))
            .collect();
        let focused = candidates.iter().position(|c| c.focused);
        Ok(match focused {
            Some(index) => Some(candidates.swap_remove(index)),
            None => candidates.into_iter().next(),
        })
    }

    async fn focus_or_open(&self, url: Url) -> Result<RouteOutcome> {
        if let Some(client) = self.find_window(&url).await? {
            self.clients.focus(client.id).await?;
            self.clients.navigate(client.id, url.as_str()).await?;
            info!("Focused window {} at {}", client.id, url);
            return Ok(RouteOutcome::Focused {
                client_id: client.id,
                url: url.to_string(),
            });
        }

        let opened = self.clients.open_window(url.as_str()).await?;
        info!("Opened window {} at {}", opened.id, url);
        Ok(RouteOutcome::Opened {
            client_id: opened.id,
            url: url.to_string(),
        })
    }
}

/// String form of a JSON string or number.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
