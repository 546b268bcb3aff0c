//! Side effects the worker asks its host runtime to perform.

use async_trait::async_trait;
use swcache_core::Error;
use tokio::sync::Mutex;
use url::Url;

use super::notify::Notification;

/// The runtime hosting the worker: open clients and the notification surface.
#[async_trait]
pub trait Host: Send + Sync {
    /// Take control of already-open clients without waiting for a reload.
    async fn claim_clients(&self) -> Result<(), Error>;

    async fn show_notification(&self, notification: &Notification) -> Result<(), Error>;

    async fn close_notification(&self, tag: &str) -> Result<(), Error>;

    /// Open (or focus) a client at `url`.
    async fn open_window(&self, url: &Url) -> Result<(), Error>;
}

/// Host for a headless runtime: every request is logged and nothing is kept.
#[derive(Debug, Default)]
pub struct LoggingHost;

impl LoggingHost {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Host for LoggingHost {
    async fn claim_clients(&self) -> Result<(), Error> {
        tracing::info!("claimed open clients");
        Ok(())
    }

    async fn show_notification(&self, notification: &Notification) -> Result<(), Error> {
        tracing::info!(tag = %notification.tag, title = %notification.title, "showing notification");
        Ok(())
    }

    async fn close_notification(&self, tag: &str) -> Result<(), Error> {
        tracing::debug!(tag, "closed notification");
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<(), Error> {
        tracing::info!(%url, "opening client window");
        Ok(())
    }
}

/// What a [`RecordingHost`] has been asked to do so far.
#[derive(Debug, Clone, Default)]
pub struct HostRecord {
    pub claims: usize,
    /// Notifications currently displayed, oldest first.
    pub notifications: Vec<Notification>,
    pub opened: Vec<Url>,
}

/// Host that logs every request and keeps an in-memory record of it.
///
/// The record is never trimmed, so this is meant for tests and short-lived
/// inspection; long-running hosts use [`LoggingHost`].
#[derive(Debug, Default)]
pub struct RecordingHost {
    record: Mutex<HostRecord>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> HostRecord {
        self.record.lock().await.clone()
    }
}

#[async_trait]
impl Host for RecordingHost {
    async fn claim_clients(&self) -> Result<(), Error> {
        let mut record = self.record.lock().await;
        record.claims += 1;
        tracing::info!(claims = record.claims, "claimed open clients");
        Ok(())
    }

    async fn show_notification(&self, notification: &Notification) -> Result<(), Error> {
        tracing::info!(tag = %notification.tag, title = %notification.title, "showing notification");
        self.record.lock().await.notifications.push(notification.clone());
        Ok(())
    }

    async fn close_notification(&self, tag: &str) -> Result<(), Error> {
        let mut record = self.record.lock().await;
        let before = record.notifications.len();
        record.notifications.retain(|n| n.tag != tag);
        tracing::debug!(tag, closed = before - record.notifications.len(), "closed notification");
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<(), Error> {
        tracing::info!(%url, "opening client window");
        self.record.lock().await.opened.push(url.clone());
        Ok(())
    }
}
