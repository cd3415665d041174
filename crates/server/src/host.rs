//! In-process host primitives for the stdio server.
//!
//! There is no real notification tray or browser window here: notifications
//! are logged and kept in a list, windows live in an in-memory table.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tether_client::{ClientHost, Notification, Notifier, WindowClient};
use tether_core::Error;
use tokio::sync::Mutex;

use crate::error::HostError;

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ShownNotification {
    pub shown_at: String,
    pub notification: Notification,
}

/// Notifier that logs each notification and keeps the displayed ones.
#[derive(Default)]
pub struct HostNotifier {
    shown: Mutex<Vec<ShownNotification>>,
}

impl HostNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications currently displayed, oldest first.
    #[cfg(test)]
    pub async fn displayed(&self) -> Vec<ShownNotification> {
        self.shown.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for HostNotifier {
    async fn show(&self, notification: &Notification) -> Result<(), Error> {
        tracing::info!(
            title = %notification.title,
            body = %notification.body,
            tag = %notification.tag,
            actions = notification.actions.len(),
            "displaying notification"
        );

        let mut shown = self.shown.lock().await;
        // A tag replaces any notification already shown under it.
        shown.retain(|s| s.notification.tag != notification.tag);
        shown.push(ShownNotification { shown_at: chrono::Utc::now().to_rfc3339(), notification: notification.clone() });
        Ok(())
    }

    async fn close(&self, tag: &str) -> Result<(), Error> {
        let mut shown = self.shown.lock().await;
        let before = shown.len();
        shown.retain(|s| s.notification.tag != tag);
        tracing::debug!(%tag, closed = before - shown.len(), "closed notification");
        Ok(())
    }
}

/// Window list with focus, open and claim.
#[derive(Default)]
pub struct WindowTable {
    windows: Mutex<Vec<WindowClient>>,
    next_id: AtomicU64,
}

impl WindowTable {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientHost for WindowTable {
    async fn windows(&self) -> Result<Vec<WindowClient>, Error> {
        Ok(self.windows.lock().await.clone())
    }

    async fn focus(&self, id: &str) -> Result<WindowClient, Error> {
        let window = self
            .windows
            .lock()
            .await
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or_else(|| HostError::UnknownWindow(id.to_string()))?;

        tracing::debug!(id, url = %window.url, "focused window");
        Ok(window)
    }

    async fn open_window(&self, url: &str) -> Result<WindowClient, Error> {
        url::Url::parse(url).map_err(|_| HostError::InvalidWindowUrl(url.to_string()))?;

        let id = format!("window-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let window = WindowClient { id, url: url.to_string() };
        self.windows.lock().await.push(window.clone());

        tracing::info!(id = %window.id, %url, "opened window");
        Ok(window)
    }

    async fn claim(&self) -> Result<(), Error> {
        let count = self.windows.lock().await.len();
        tracing::info!(clients = count, "claimed open clients");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notifier_replaces_by_tag_and_closes() {
        let notifier = HostNotifier::new();
        let first = Notification { title: "one".into(), ..Default::default() };
        let second = Notification { title: "two".into(), ..Default::default() };

        notifier.show(&first).await.unwrap();
        notifier.show(&second).await.unwrap();
        let displayed = notifier.displayed().await;
        assert_eq!(displayed.len(), 1);
        assert_eq!(displayed[0].notification.title, "two");

        notifier.close(&second.tag).await.unwrap();
        assert!(notifier.displayed().await.is_empty());
    }

    #[tokio::test]
    async fn test_window_table_open_focus_claim() {
        let table = WindowTable::new();
        let opened = table.open_window("http://localhost:3000/").await.unwrap();
        assert_eq!(opened.id, "window-0");

        table.open_window("http://localhost:3000/posts").await.unwrap();
        let focused = table.focus("window-0").await.unwrap();
        assert_eq!(focused.url, "http://localhost:3000/");
        assert_eq!(table.windows().await.unwrap().len(), 2);

        table.claim().await.unwrap();
    }

    #[tokio::test]
    async fn test_window_table_errors() {
        let table = WindowTable::new();
        assert!(matches!(table.focus("nope").await, Err(Error::InvalidInput(_))));
        assert!(table.open_window("/relative").await.is_err());
    }
}
