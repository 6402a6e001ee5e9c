//! Push payload wire format.

use serde_json::{Map, Value};

use crate::notification::NotificationAction;

/// Structured push payload as sent by the delivery server.
///
/// Every field is optional; absent fields and fields of the wrong type take
/// the receiver's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub image: Option<String>,
    pub tag: Option<String>,
    pub require_interaction: Option<bool>,
    pub vibrate: Option<Vec<u32>>,
    pub data: Option<Map<String, Value>>,
    pub actions: Option<Vec<NotificationAction>>,
    /// Alert category, e.g. `"emergency"`
    pub kind: Option<String>,
    /// Target page; some senders put it here instead of in `data`
    pub url: Option<String>,
}

impl PushPayload {
    /// Reads each field on its own, ignoring any with an unexpected type.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            title: text("title"),
            body: text("body"),
            icon: text("icon"),
            badge: text("badge"),
            image: text("image"),
            tag: text("tag"),
            require_interaction: object.get("requireInteraction").and_then(Value::as_bool),
            vibrate: object.get("vibrate").and_then(vibrate_pattern),
            data: object.get("data").and_then(Value::as_object).cloned(),
            actions: object.get("actions").and_then(action_list),
            kind: text("type"),
            url: text("url"),
        }
    }

    /// Top-level `type`, falling back to `data.type`.
    pub fn alert_type(&self) -> Option<&str> {
        self.kind.as_deref().or_else(|| {
            self.data
                .as_ref()
                .and_then(|d| d.get("type"))
                .and_then(Value::as_str)
        })
    }

    pub fn is_emergency(&self) -> bool {
        self.alert_type() == Some("emergency")
    }
}

/// A push message after decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPush {
    /// No payload, or an empty one
    Empty,
    Structured(PushPayload),
    /// Anything that is not a valid structured payload
    PlainText(String),
}

/// Decodes raw push bytes. Never fails: malformed input becomes plain text.
pub fn decode(payload: Option<&[u8]>) -> DecodedPush {
    let Some(bytes) = payload else {
        return DecodedPush::Empty;
    };
    let text = String::from_utf8_lossy(bytes);
    if text.trim().is_empty() {
        return DecodedPush::Empty;
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(object)) => DecodedPush::Structured(PushPayload::from_object(&object)),
        _ => DecodedPush::PlainText(text.into_owned()),
    }
}

/// A vibration pattern, if every element is a valid duration.
fn vibrate_pattern(value: &Value) -> Option<Vec<u32>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_u64().and_then(|n| u32::try_from(n).ok()))
        .collect()
}

/// Well-formed actions from the list. A list with none is treated as absent.
fn action_list(value: &Value) -> Option<Vec<NotificationAction>> {
    let items = value.as_array()?;
    let actions: Vec<NotificationAction> = items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect();
    if actions.is_empty() && !items.is_empty() {
        return None;
    }
    Some(actions)
}
