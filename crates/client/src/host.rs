//! Primitives the embedding host provides to the worker.
//!
//! The worker never talks to windows or the notification tray directly;
//! it goes through these traits, which the binary implements and tests fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tether_core::Error;

use crate::notify::Notification;

/// An open window controlled (or controllable) by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
}

/// Notification display primitive.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Display a notification; resolves once it is shown.
    async fn show(&self, notification: &Notification) -> Result<(), Error>;

    /// Close any displayed notification with this tag.
    async fn close(&self, tag: &str) -> Result<(), Error>;
}

/// Window enumeration, focus and takeover primitive.
#[async_trait]
pub trait ClientHost: Send + Sync {
    async fn windows(&self) -> Result<Vec<WindowClient>, Error>;

    async fn focus(&self, id: &str) -> Result<WindowClient, Error>;

    async fn open_window(&self, url: &str) -> Result<WindowClient, Error>;

    /// Take control of every open client without waiting for navigation.
    async fn claim(&self) -> Result<(), Error>;
}

/// Drains the generic queue of writes made while offline (`background-sync` tag).
#[async_trait]
pub trait BackgroundSyncHook: Send + Sync {
    /// Re-submit pending writes, returning how many were sent.
    async fn drain(&self) -> Result<usize, Error>;
}

/// Hook used when the host has no pending-write queue.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPendingWrites;

#[async_trait]
impl BackgroundSyncHook for NoPendingWrites {
    async fn drain(&self) -> Result<usize, Error> {
        tracing::debug!("background-sync: no pending-write queue configured");
        Ok(0)
    }
}
