//! Event registry.
//!
//! The worker reacts to discrete events. Each [`EventKind`] maps to one
//! handler; [`ServiceWorker::new`] installs the default set and
//! [`ServiceWorker::register`] replaces any of them. Handlers share a
//! [`WorkerContext`] and may run concurrently (fetches interleave freely).

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tether_core::{CacheDb, Error};

use crate::classify::is_intercepted;
use crate::config::WorkerConfig;
use crate::fetch::{Network, Request};
use crate::host::{BackgroundSyncHook, ClientHost, NoPendingWrites, Notifier};
use crate::lifecycle::{ActivateReport, InstallReport, LifecycleManager};
use crate::notify::{self, ClickOutcome, Notification};
use crate::strategy::{Served, StrategyExecutor};
use crate::sync::{self, SyncReport, SyncTag};

pub const SKIP_WAITING_MESSAGE: &str = "SKIP_WAITING";
pub const GET_VERSION_MESSAGE: &str = "GET_VERSION";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    Push,
    NotificationClick,
    Sync,
    Message,
}

#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    Push(Option<Vec<u8>>),
    NotificationClick { tag: String, action: Option<String> },
    Sync(String),
    Message(String),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Install => EventKind::Install,
            Event::Activate => EventKind::Activate,
            Event::Fetch(_) => EventKind::Fetch,
            Event::Push(_) => EventKind::Push,
            Event::NotificationClick { .. } => EventKind::NotificationClick,
            Event::Sync(_) => EventKind::Sync,
            Event::Message(_) => EventKind::Message,
        }
    }
}

#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Served(Served),
    /// The request is not ours; the host performs it untouched.
    Passthrough,
    Notified(Notification),
    Clicked(ClickOutcome),
    SearchHistorySynced(SyncReport),
    PendingWritesDrained(usize),
    Reply(serde_json::Value),
    Ignored,
}

/// Everything handlers share.
pub struct WorkerContext {
    pub config: WorkerConfig,
    pub db: CacheDb,
    pub network: Arc<dyn Network>,
    pub notifier: Arc<dyn Notifier>,
    pub clients: Arc<dyn ClientHost>,
    pub background_sync: Arc<dyn BackgroundSyncHook>,
    pub lifecycle: LifecycleManager,
}

impl WorkerContext {
    pub fn new(
        config: WorkerConfig, db: CacheDb, network: Arc<dyn Network>, notifier: Arc<dyn Notifier>,
        clients: Arc<dyn ClientHost>,
    ) -> Self {
        let lifecycle = LifecycleManager::new(&config);
        Self { config, db, network, notifier, clients, background_sync: Arc::new(NoPendingWrites), lifecycle }
    }

    pub fn with_background_sync(mut self, hook: Arc<dyn BackgroundSyncHook>) -> Self {
        self.background_sync = hook;
        self
    }
}

pub type Handler =
    Arc<dyn Fn(Arc<WorkerContext>, Event) -> BoxFuture<'static, Result<EventOutcome, Error>> + Send + Sync>;

/// Wrap an async fn as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Arc<WorkerContext>, Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<EventOutcome, Error>> + Send + 'static,
{
    Arc::new(move |ctx, event| f(ctx, event).boxed())
}

pub struct ServiceWorker {
    ctx: Arc<WorkerContext>,
    handlers: HashMap<EventKind, Handler>,
}

impl ServiceWorker {
    /// A worker with the default handler for every event kind.
    pub fn new(ctx: WorkerContext) -> Self {
        let mut worker = Self::without_handlers(ctx);
        worker.register(EventKind::Install, handler(on_install));
        worker.register(EventKind::Activate, handler(on_activate));
        worker.register(EventKind::Fetch, handler(on_fetch));
        worker.register(EventKind::Push, handler(on_push));
        worker.register(EventKind::NotificationClick, handler(on_notification_click));
        worker.register(EventKind::Sync, handler(on_sync));
        worker.register(EventKind::Message, handler(on_message));
        worker
    }

    pub fn without_handlers(ctx: WorkerContext) -> Self {
        Self { ctx: Arc::new(ctx), handlers: HashMap::new() }
    }

    /// Install `handler` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: EventKind, handler: Handler) {
        self.handlers.insert(kind, handler);
    }

    pub fn context(&self) -> &Arc<WorkerContext> {
        &self.ctx
    }

    /// Run the handler for this event to completion.
    pub async fn dispatch(&self, event: Event) -> Result<EventOutcome, Error> {
        let kind = event.kind();
        let handler = self
            .handlers
            .get(&kind)
            .cloned()
            .ok_or_else(|| Error::NoHandler(format!("{kind:?}")))?;

        tracing::debug!(?kind, "dispatching event");
        handler(self.ctx.clone(), event).await
    }
}

fn unexpected(expected: EventKind, received: EventKind) -> Error {
    Error::InvalidInput(format!("{expected:?} handler received {received:?} event"))
}

async fn on_install(ctx: Arc<WorkerContext>, _event: Event) -> Result<EventOutcome, Error> {
    ctx.lifecycle.install(&ctx.db, ctx.network.clone()).await.map(EventOutcome::Installed)
}

async fn on_activate(ctx: Arc<WorkerContext>, _event: Event) -> Result<EventOutcome, Error> {
    ctx.lifecycle.activate(&ctx.db, ctx.clients.as_ref()).await.map(EventOutcome::Activated)
}

async fn on_fetch(ctx: Arc<WorkerContext>, event: Event) -> Result<EventOutcome, Error> {
    let received = event.kind();
    let Event::Fetch(request) = event else {
        return Err(unexpected(EventKind::Fetch, received));
    };

    if !is_intercepted(&request) {
        tracing::debug!(url = %request.url, "passing through");
        return Ok(EventOutcome::Passthrough);
    }

    StrategyExecutor::new(&ctx.config, &ctx.db, ctx.network.as_ref())
        .execute(&request)
        .await
        .map(EventOutcome::Served)
}

async fn on_push(ctx: Arc<WorkerContext>, event: Event) -> Result<EventOutcome, Error> {
    let received = event.kind();
    let Event::Push(data) = event else {
        return Err(unexpected(EventKind::Push, received));
    };
    notify::show_push(ctx.notifier.as_ref(), data.as_deref()).await.map(EventOutcome::Notified)
}

async fn on_notification_click(ctx: Arc<WorkerContext>, event: Event) -> Result<EventOutcome, Error> {
    let received = event.kind();
    let Event::NotificationClick { tag, action } = event else {
        return Err(unexpected(EventKind::NotificationClick, received));
    };
    notify::handle_click(
        ctx.notifier.as_ref(),
        ctx.clients.as_ref(),
        &tag,
        action.as_deref(),
        ctx.config.origin.as_str(),
    )
    .await
    .map(EventOutcome::Clicked)
}

async fn on_sync(ctx: Arc<WorkerContext>, event: Event) -> Result<EventOutcome, Error> {
    let received = event.kind();
    let Event::Sync(tag) = event else {
        return Err(unexpected(EventKind::Sync, received));
    };

    match SyncTag::parse(&tag) {
        SyncTag::BackgroundSync => ctx.background_sync.drain().await.map(EventOutcome::PendingWritesDrained),
        SyncTag::SearchHistory => {
            sync::sync_search_history(&ctx.db, ctx.network.as_ref(), &ctx.config.sync_history_endpoint)
                .await
                .map(EventOutcome::SearchHistorySynced)
        }
        SyncTag::Other(tag) => {
            tracing::debug!(%tag, "ignoring unknown sync tag");
            Ok(EventOutcome::Ignored)
        }
    }
}

async fn on_message(ctx: Arc<WorkerContext>, event: Event) -> Result<EventOutcome, Error> {
    let received = event.kind();
    let Event::Message(kind) = event else {
        return Err(unexpected(EventKind::Message, received));
    };

    match kind.as_str() {
        SKIP_WAITING_MESSAGE => {
            ctx.lifecycle.request_skip_waiting();
            Ok(EventOutcome::Ignored)
        }
        GET_VERSION_MESSAGE => {
            Ok(EventOutcome::Reply(serde_json::json!({ "partitions": ctx.lifecycle.partitions().names() })))
        }
        other => {
            tracing::debug!(message = other, "ignoring unknown message");
            Ok(EventOutcome::Ignored)
        }
    }
}
