//! The offline cache worker.
//!
//! A [`Worker`] owns one cache generation (named by its [`WorkerConfig`])
//! and moves through the lifecycle
//! `Parsed → Installing → Waiting → Activating → Active`.
//! A failed install leaves it `Redundant`, from where install may be retried.
//!
//! Hosts drive the worker either through the individual `handle_*` methods
//! or by routing [`Event`]s through [`Worker::dispatch`].

pub mod config;
pub mod host;
mod intercept;
mod lifecycle;
pub mod notify;
pub mod sync;

use schemars::JsonSchema;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64};
use swcache_core::{CacheDb, Error};
use tokio::sync::RwLock;
use url::Url;

use crate::fetch::{Network, Request, Response};

pub use config::{NotificationConfig, WorkerConfig};
pub use host::{Host, HostRecord, LoggingHost, RecordingHost};
pub use lifecycle::{ActivationReport, MessageOutcome, SKIP_WAITING};
pub use notify::{CLOSE_ACTION, EXPLORE_ACTION, Notification, NotificationAction, NotificationClick, NotificationData};
pub use sync::{OutboxSync, SyncHandler, SyncReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Parsed,
    Installing,
    Waiting,
    Activating,
    Active,
    Redundant,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Parsed => "parsed",
            LifecycleState::Installing => "installing",
            LifecycleState::Waiting => "waiting",
            LifecycleState::Activating => "activating",
            LifecycleState::Active => "active",
            LifecycleState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events a host runtime delivers to the worker.
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    Sync { tag: String },
    Push { payload: Option<String> },
    NotificationClick(NotificationClick),
    Message(serde_json::Value),
}

/// Completion value for each [`Event`].
#[derive(Debug, Clone)]
pub enum EventOutcome {
    /// Install finished; `activation` is set when skip-waiting moved straight on.
    Installed { activation: Option<ActivationReport> },
    Activated(ActivationReport),
    Responded(Response),
    Synced(Option<SyncReport>),
    NotificationShown(Notification),
    NotificationHandled { opened: Option<Url> },
    Message(MessageOutcome),
}

pub struct Worker {
    config: WorkerConfig,
    db: CacheDb,
    network: Arc<dyn Network>,
    host: Arc<dyn Host>,
    sync: Arc<dyn SyncHandler>,
    state: RwLock<LifecycleState>,
    skip_waiting: AtomicBool,
    notification_seq: AtomicU64,
}

impl Worker {
    /// Create a worker in the `Parsed` state that replays the outbox on sync.
    pub fn new(config: WorkerConfig, db: CacheDb, network: Arc<dyn Network>, host: Arc<dyn Host>) -> Self {
        let sync = Arc::new(OutboxSync::new(db.clone(), network.clone()));
        Self {
            config,
            db,
            network,
            host,
            sync,
            state: RwLock::new(LifecycleState::Parsed),
            skip_waiting: AtomicBool::new(false),
            notification_seq: AtomicU64::new(0),
        }
    }

    /// Replace the background sync handler.
    pub fn with_sync_handler(mut self, sync: Arc<dyn SyncHandler>) -> Self {
        self.sync = sync;
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn cache_name(&self) -> &str {
        &self.config.cache_name
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Route an event to its handler.
    ///
    /// The returned future is the event's pending work; a host must not
    /// recycle the worker before it resolves.
    pub async fn dispatch(&self, event: Event) -> Result<EventOutcome, Error> {
        match event {
            Event::Install => {
                self.install().await?;
                let activation = if self.skip_waiting_requested() { self.activate_if_waiting().await? } else { None };
                Ok(EventOutcome::Installed { activation })
            }
            Event::Activate => self.activate().await.map(EventOutcome::Activated),
            Event::Fetch(request) => self.handle_fetch(request).await.map(EventOutcome::Responded),
            Event::Sync { tag } => self.handle_sync(&tag).await.map(EventOutcome::Synced),
            Event::Push { payload } => self
                .handle_push(payload.as_deref())
                .await
                .map(EventOutcome::NotificationShown),
            Event::NotificationClick(click) => self
                .handle_notification_click(&click)
                .await
                .map(|opened| EventOutcome::NotificationHandled { opened }),
            Event::Message(message) => self.handle_message(&message).await.map(EventOutcome::Message),
        }
    }
}
