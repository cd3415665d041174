//! Push notifications: payload parsing, display and click handling.

use serde::{Deserialize, Serialize};
use tether_core::Error;

use crate::host::{ClientHost, Notifier, WindowClient};

pub const DEFAULT_TAG: &str = "tether-notification";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl NotificationAction {
    fn new(action: &str, title: &str) -> Self {
        Self { action: action.to_string(), title: title.to_string(), icon: None }
    }
}

/// A notification ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    /// Vibration pattern in milliseconds.
    pub vibrate: Vec<u32>,
    pub actions: Vec<NotificationAction>,
}

impl Default for Notification {
    fn default() -> Self {
        Self {
            title: "新着情報".to_string(),
            body: "新しいお知らせがあります".to_string(),
            icon: "/images/icon-192x192.png".to_string(),
            badge: "/images/badge-72x72.png".to_string(),
            tag: DEFAULT_TAG.to_string(),
            vibrate: vec![200, 100, 200],
            actions: vec![NotificationAction::new("view", "表示"), NotificationAction::new("dismiss", "閉じる")],
        }
    }
}

/// Server-sent fields; anything absent keeps its default.
#[derive(Debug, Clone, Default)]
pub struct PartialNotification {
    pub title: Option<String>,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub tag: Option<String>,
    pub vibrate: Option<Vec<u32>>,
    /// Kept raw so a malformed list can be rejected without failing the payload.
    pub actions: Option<serde_json::Value>,
}

/// Typed read of one field; a field of the wrong type is dropped on its own.
fn field<T: serde::de::DeserializeOwned>(object: &serde_json::Map<String, serde_json::Value>, name: &str) -> Option<T> {
    let value = object.get(name)?;
    match T::deserialize(value) {
        Ok(typed) => Some(typed),
        Err(err) => {
            tracing::warn!(field = name, error = %err, "ignoring ill-typed push field");
            None
        }
    }
}

impl PartialNotification {
    pub fn from_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            title: field(object, "title"),
            body: field(object, "body"),
            icon: field(object, "icon"),
            badge: field(object, "badge"),
            tag: field(object, "tag"),
            vibrate: field(object, "vibrate"),
            actions: object.get("actions").cloned(),
        }
    }

    pub fn merge_onto(self, mut base: Notification) -> Notification {
        if let Some(title) = self.title {
            base.title = title;
        }
        if let Some(body) = self.body {
            base.body = body;
        }
        if let Some(icon) = self.icon {
            base.icon = icon;
        }
        if let Some(badge) = self.badge {
            base.badge = badge;
        }
        if let Some(tag) = self.tag {
            base.tag = tag;
        }
        if let Some(vibrate) = self.vibrate {
            base.vibrate = vibrate;
        }
        if let Some(raw) = self.actions {
            match validate_actions(raw) {
                Ok(actions) => base.actions = actions,
                Err(reason) => tracing::warn!(%reason, "ignoring push actions"),
            }
        }
        base
    }
}

/// Every entry needs non-empty `action` and `title`; one bad entry rejects the list.
fn validate_actions(raw: serde_json::Value) -> Result<Vec<NotificationAction>, String> {
    let actions: Vec<NotificationAction> = serde_json::from_value(raw).map_err(|e| e.to_string())?;
    for (i, action) in actions.iter().enumerate() {
        if action.action.trim().is_empty() || action.title.trim().is_empty() {
            return Err(format!("action {i} has an empty action or title"));
        }
    }
    Ok(actions)
}

impl Notification {
    /// Build from push data: JSON object fields over defaults, else text as body, else defaults.
    pub fn from_push(data: Option<&[u8]>) -> Self {
        let Some(data) = data.filter(|d| !d.is_empty()) else {
            return Self::default();
        };

        if let Ok(serde_json::Value::Object(object)) = serde_json::from_slice::<serde_json::Value>(data) {
            return PartialNotification::from_object(&object).merge_onto(Self::default());
        }

        match std::str::from_utf8(data) {
            Ok(text) => Self { body: text.to_string(), ..Self::default() },
            Err(_) => {
                tracing::warn!(bytes = data.len(), "push data is neither JSON nor text");
                Self::default()
            }
        }
    }
}

/// Parse push data and wait for the notification to be shown.
pub async fn show_push(notifier: &dyn Notifier, data: Option<&[u8]>) -> Result<Notification, Error> {
    let notification = Notification::from_push(data);
    notifier.show(&notification).await?;
    tracing::info!(tag = %notification.tag, "notification shown");
    Ok(notification)
}

/// What a notification click did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    Dismissed,
    Focused { window: WindowClient },
    Opened { window: WindowClient },
}

/// Close the notification, then route the click by action.
pub async fn handle_click(
    notifier: &dyn Notifier, clients: &dyn ClientHost, tag: &str, action: Option<&str>, root_url: &str,
) -> Result<ClickOutcome, Error> {
    notifier.close(tag).await?;

    match action {
        Some("dismiss") => Ok(ClickOutcome::Dismissed),
        Some("view") | None => open_root(clients, root_url).await,
        Some(other) => {
            tracing::debug!(action = other, "unknown notification action, treating as view");
            open_root(clients, root_url).await
        }
    }
}

async fn open_root(clients: &dyn ClientHost, root_url: &str) -> Result<ClickOutcome, Error> {
    let windows = clients.windows().await?;
    if let Some(existing) = windows.iter().find(|w| w.url == root_url) {
        let window = clients.focus(&existing.id).await?;
        return Ok(ClickOutcome::Focused { window });
    }

    let window = clients.open_window(root_url).await?;
    Ok(ClickOutcome::Opened { window })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingClients, RecordingNotifier};

    const ROOT: &str = "http://localhost:3000/";

    #[test]
    fn test_no_data_is_default() {
        assert_eq!(Notification::from_push(None), Notification::default());
        assert_eq!(Notification::from_push(Some(b"".as_slice())), Notification::default());
    }

    #[test]
    fn test_json_fields_override_defaults() {
        let n = Notification::from_push(Some(br#"{"title":"New event","tag":"events"}"#.as_slice()));
        assert_eq!(n.title, "New event");
        assert_eq!(n.tag, "events");
        assert_eq!(n.body, Notification::default().body);
        assert_eq!(n.actions.len(), 2);
    }

    #[test]
    fn test_ill_typed_fields_dropped_individually() {
        let n = Notification::from_push(Some(br#"{"title":"Event","vibrate":[-1]}"#.as_slice()));
        assert_eq!(n.title, "Event");
        assert_eq!(n.vibrate, Notification::default().vibrate);
        assert_eq!(n.body, Notification::default().body);

        let n = Notification::from_push(Some(br#"{"title":5,"body":"hello"}"#.as_slice()));
        assert_eq!(n.title, Notification::default().title);
        assert_eq!(n.body, "hello");
    }

    #[test]
    fn test_plain_text_becomes_body() {
        let n = Notification::from_push(Some("明日のイベント".as_bytes()));
        assert_eq!(n.body, "明日のイベント");
        assert_eq!(n.title, Notification::default().title);
    }

    #[test]
    fn test_invalid_utf8_is_default() {
        assert_eq!(Notification::from_push(Some([0xffu8, 0xfe, 0x00].as_slice())), Notification::default());
    }

    #[test]
    fn test_valid_actions_replace_defaults() {
        let n = Notification::from_push(Some(br#"{"actions":[{"action":"open","title":"Open"}]}"#.as_slice()));
        assert_eq!(n.actions, vec![NotificationAction::new("open", "Open")]);
    }

    #[test]
    fn test_malformed_actions_rejected_as_whole() {
        let n = Notification::from_push(Some(br#"{"body":"hi","actions":[{"action":"open","title":"Open"},{"action":""}]}"#.as_slice()));
        assert_eq!(n.body, "hi");
        assert_eq!(n.actions, Notification::default().actions);

        let n = Notification::from_push(Some(br#"{"actions":"nope"}"#.as_slice()));
        assert_eq!(n.actions, Notification::default().actions);
    }

    #[tokio::test]
    async fn test_show_push_waits_for_display() {
        let notifier = RecordingNotifier::default();
        let shown = show_push(&notifier, Some(br#"{"title":"t"}"#.as_slice())).await.unwrap();
        assert_eq!(notifier.shown.lock().unwrap().as_slice(), &[shown]);
    }

    #[tokio::test]
    async fn test_dismiss_opens_nothing() {
        let notifier = RecordingNotifier::default();
        let clients = RecordingClients::default();

        let outcome = handle_click(&notifier, &clients, DEFAULT_TAG, Some("dismiss"), ROOT).await.unwrap();

        assert_eq!(outcome, ClickOutcome::Dismissed);
        assert_eq!(notifier.closed.lock().unwrap().as_slice(), &[DEFAULT_TAG.to_string()]);
        assert!(clients.opened.lock().unwrap().is_empty());
        assert!(clients.focused.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_view_reuses_root_window() {
        let notifier = RecordingNotifier::default();
        let clients = RecordingClients::with_windows(&["http://localhost:3000/posts", ROOT]);

        let outcome = handle_click(&notifier, &clients, DEFAULT_TAG, Some("view"), ROOT).await.unwrap();

        assert!(matches!(outcome, ClickOutcome::Focused { ref window } if window.id == "w1"));
        assert!(clients.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_body_click_opens_new_window() {
        let notifier = RecordingNotifier::default();
        let clients = RecordingClients::with_windows(&["http://localhost:3000/posts"]);

        let outcome = handle_click(&notifier, &clients, DEFAULT_TAG, None, ROOT).await.unwrap();

        assert!(matches!(outcome, ClickOutcome::Opened { ref window } if window.url == ROOT));
        assert_eq!(clients.opened.lock().unwrap().as_slice(), &[ROOT.to_string()]);
    }
}
