//! Push receiver: payload in, exactly one displayed notification out.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use super::payload::{decode, DecodedPush, PushPayload};
use crate::config::{NotificationDefaults, WorkerConfig};
use crate::error::Result;
use crate::notification::{NotificationAction, NotificationDescriptor};
use crate::platform::NotificationDisplay;

/// Vibration used for emergency alerts.
pub const EMERGENCY_VIBRATE: [u32; 5] = [500, 200, 500, 200, 500];

/// Tag given to emergency alerts that carry none.
pub const EMERGENCY_TAG: &str = "emergency-alert";

/// The only actions an emergency alert offers.
pub fn emergency_actions() -> Vec<NotificationAction> {
    vec![
        NotificationAction::new("respond", "📞 Respond"),
        NotificationAction::new("location", "📍 View Location"),
    ]
}

/// Actions on ordinary notifications that declare none.
pub fn default_actions(icon: &str) -> Vec<NotificationAction> {
    vec![
        NotificationAction::new("explore", "Open App").with_icon(icon),
        NotificationAction::new("close", "Close").with_icon(icon),
    ]
}

/// Turns push messages into displayed notifications.
pub struct PushReceiver {
    display: Arc<dyn NotificationDisplay>,
    config: Arc<WorkerConfig>,
}

impl std::fmt::Debug for PushReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushReceiver")
            .field("defaults", &self.config.notifications)
            .finish_non_exhaustive()
    }
}

impl PushReceiver {
    pub fn new(display: Arc<dyn NotificationDisplay>, config: Arc<WorkerConfig>) -> Self {
        Self { display, config }
    }

    /// Decodes the payload and shows the resulting notification.
    pub async fn receive(&self, payload: Option<&[u8]>) -> Result<NotificationDescriptor> {
        let descriptor = self.describe(payload);
        self.display.show(&descriptor).await?;
        info!(tag = %descriptor.tag, title = %descriptor.title, "Push notification displayed");
        Ok(descriptor)
    }

    /// Builds the descriptor for a payload without displaying it.
    pub fn describe(&self, payload: Option<&[u8]>) -> NotificationDescriptor {
        let defaults = &self.config.notifications;
        let now = chrono::Utc::now().timestamp_millis();

        match decode(payload) {
            DecodedPush::Empty => self.base(defaults, defaults.body.clone(), now),
            DecodedPush::PlainText(text) => {
                warn!("Push payload is not structured, showing it as text");
                self.base(defaults, text, now)
            }
            DecodedPush::Structured(parsed) => self.merge(defaults, parsed, now),
        }
    }

    fn base(&self, defaults: &NotificationDefaults, body: String, now: i64) -> NotificationDescriptor {
        let mut data = Map::new();
        data.insert("dateOfArrival".to_string(), Value::from(now));
        NotificationDescriptor {
            title: defaults.title.clone(),
            body,
            icon: defaults.icon.clone(),
            badge: defaults.badge.clone(),
            vibrate: defaults.vibrate.clone(),
            tag: defaults.tag.clone(),
            require_interaction: false,
            actions: default_actions(&defaults.badge),
            data: Value::Object(data),
            image: None,
            timestamp: now,
        }
    }

    fn merge(&self, defaults: &NotificationDefaults, parsed: PushPayload, now: i64) -> NotificationDescriptor {
        let emergency = parsed.is_emergency();
        let alert_type = parsed.alert_type().map(str::to_string);

        let mut data = parsed.data.unwrap_or_default();
        if let Some(url) = non_empty(parsed.url) {
            data.entry("url").or_insert(Value::String(url));
        }
        if let Some(kind) = alert_type {
            data.entry("type").or_insert(Value::String(kind));
        }
        data.entry("dateOfArrival").or_insert(Value::from(now));

        let mut descriptor = NotificationDescriptor {
            title: non_empty(parsed.title).unwrap_or_else(|| defaults.title.clone()),
            body: non_empty(parsed.body).unwrap_or_else(|| defaults.body.clone()),
            icon: non_empty(parsed.icon).unwrap_or_else(|| defaults.icon.clone()),
            badge: non_empty(parsed.badge).unwrap_or_else(|| defaults.badge.clone()),
            vibrate: parsed.vibrate.unwrap_or_else(|| defaults.vibrate.clone()),
            tag: non_empty(parsed.tag.clone()).unwrap_or_else(|| defaults.tag.clone()),
            require_interaction: parsed.require_interaction.unwrap_or(false),
            actions: parsed
                .actions
                .unwrap_or_else(|| default_actions(&defaults.badge)),
            data: Value::Object(data),
            image: non_empty(parsed.image),
            timestamp: now,
        };

        if emergency {
            descriptor.require_interaction = true;
            descriptor.vibrate = EMERGENCY_VIBRATE.to_vec();
            descriptor.actions = emergency_actions();
            if non_empty(parsed.tag).is_none() {
                descriptor.tag = EMERGENCY_TAG.to_string();
            }
        }

        descriptor
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
