//! Offline request caching for tether.
//!
//! This crate holds the worker: request classification, caching strategies,
//! the install/activate lifecycle, push and sync hooks, and the event
//! registry that ties them together. Host primitives (network, windows,
//! notifications) come in through traits.

pub mod classify;
pub mod config;
pub mod fallback;
pub mod fetch;
pub mod host;
pub mod lifecycle;
pub mod notify;
pub mod strategy;
pub mod sync;
pub mod worker;

#[cfg(test)]
mod testing;

pub use classify::{RouteClass, classify, is_intercepted};
pub use config::WorkerConfig;
pub use fetch::{Destination, FetchClient, FetchConfig, Network, Request};
pub use host::{BackgroundSyncHook, ClientHost, NoPendingWrites, Notifier, WindowClient};
pub use lifecycle::{ActivateReport, InstallReport, LifecycleManager, LifecycleState};
pub use notify::{ClickOutcome, Notification, NotificationAction};
pub use strategy::{ResponseSource, Served, Strategy, StrategyExecutor};
pub use sync::{SyncReport, SyncTag};
pub use worker::{Event, EventKind, EventOutcome, Handler, ServiceWorker, WorkerContext, handler};
