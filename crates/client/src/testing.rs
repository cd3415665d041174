//! In-process fakes for the host primitives, used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tether_core::{Error, ResponseSnapshot};

use crate::fetch::{Network, Request};
use crate::host::{ClientHost, Notifier, WindowClient};
use crate::notify::Notification;

/// Network that answers from a route table and records every call.
#[derive(Default)]
pub struct MockNetwork {
    routes: Mutex<HashMap<String, ResponseSnapshot>>,
    calls: Mutex<Vec<Request>>,
    offline: AtomicBool,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with `status` for `url`.
    pub fn route(&self, url: &str, status: u16, content_type: &str, body: &str) {
        let response =
            ResponseSnapshot::new(url, status).with_header("Content-Type", content_type).with_body(body.as_bytes());
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, Error> {
        self.calls.lock().unwrap().push(request.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("network unreachable".into()));
        }

        self.routes
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| Error::Network(format!("connection refused: {}", request.url)))
    }
}

/// Notifier that remembers what was shown and closed.
#[derive(Default)]
pub struct RecordingNotifier {
    pub shown: Mutex<Vec<Notification>>,
    pub closed: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn show(&self, notification: &Notification) -> Result<(), Error> {
        self.shown.lock().unwrap().push(notification.clone());
        Ok(())
    }

    async fn close(&self, tag: &str) -> Result<(), Error> {
        self.closed.lock().unwrap().push(tag.to_string());
        Ok(())
    }
}

/// Window host with a fixed starting set of windows.
#[derive(Default)]
pub struct RecordingClients {
    pub windows: Mutex<Vec<WindowClient>>,
    pub focused: Mutex<Vec<String>>,
    pub opened: Mutex<Vec<String>>,
    pub claimed: AtomicBool,
}

impl RecordingClients {
    pub fn with_windows(urls: &[&str]) -> Self {
        let windows = urls
            .iter()
            .enumerate()
            .map(|(i, url)| WindowClient { id: format!("w{i}"), url: url.to_string() })
            .collect();
        Self { windows: Mutex::new(windows), ..Default::default() }
    }
}

#[async_trait]
impl ClientHost for RecordingClients {
    async fn windows(&self) -> Result<Vec<WindowClient>, Error> {
        Ok(self.windows.lock().unwrap().clone())
    }

    async fn focus(&self, id: &str) -> Result<WindowClient, Error> {
        self.focused.lock().unwrap().push(id.to_string());
        self.windows
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or_else(|| Error::InvalidInput(format!("no window {id}")))
    }

    async fn open_window(&self, url: &str) -> Result<WindowClient, Error> {
        self.opened.lock().unwrap().push(url.to_string());
        let mut windows = self.windows.lock().unwrap();
        let window = WindowClient { id: format!("w{}", windows.len()), url: url.to_string() };
        windows.push(window.clone());
        Ok(window)
    }

    async fn claim(&self) -> Result<(), Error> {
        self.claimed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
