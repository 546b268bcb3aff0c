//! Background sync: replaying writes queued while offline.

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{HeaderName, HeaderValue};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use swcache_core::{CacheDb, Error, OutboxEntry};
use url::Url;

use super::Worker;
use crate::fetch::{Network, Request};

/// Result of one flush.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SyncReport {
    pub delivered: usize,
    pub dropped: usize,
    pub remaining: usize,
}

/// Invoked when connectivity returns and the sync tag fires.
#[async_trait]
pub trait SyncHandler: Send + Sync {
    async fn flush(&self) -> Result<SyncReport, Error>;
}

/// Replays the outbox in insertion order.
///
/// - 2xx: delivered, removed
/// - 4xx or an unsendable entry: dropped, removed
/// - 5xx or network failure: flush stops; the entry and everything after it stay queued
pub struct OutboxSync {
    db: CacheDb,
    network: Arc<dyn Network>,
}

impl OutboxSync {
    pub fn new(db: CacheDb, network: Arc<dyn Network>) -> Self {
        Self { db, network }
    }
}

fn to_request(entry: &OutboxEntry) -> Result<Request, String> {
    let method = Method::from_bytes(entry.method.as_bytes()).map_err(|e| format!("method: {e}"))?;
    let url = Url::parse(&entry.url).map_err(|e| format!("url: {e}"))?;

    let mut request = Request::new(method, url);
    for (name, value) in &entry.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| format!("header: {e}"))?;
        let value = HeaderValue::from_str(value).map_err(|e| format!("header {name}: {e}"))?;
        request = request.with_header(name, value);
    }
    if let Some(body) = &entry.body {
        request = request.with_body(body.clone());
    }
    Ok(request)
}

#[async_trait]
impl SyncHandler for OutboxSync {
    async fn flush(&self) -> Result<SyncReport, Error> {
        let pending = self.db.pending_outbox().await?;
        let mut report = SyncReport { remaining: pending.len(), ..Default::default() };

        for entry in &pending {
            let request = match to_request(entry) {
                Ok(request) => request,
                Err(reason) => {
                    tracing::warn!(id = entry.id, url = %entry.url, %reason, "dropping unsendable outbox entry");
                    self.db.remove_outbox(entry.id).await?;
                    report.dropped += 1;
                    report.remaining -= 1;
                    continue;
                }
            };

            let status = match self.network.fetch(request).await {
                Ok(response) => response.status,
                Err(e) => {
                    return Err(Error::SyncFailed(format!(
                        "{} delivered, {} remaining: {e}",
                        report.delivered, report.remaining
                    )));
                }
            };

            if status.is_server_error() {
                return Err(Error::SyncFailed(format!(
                    "{} delivered, {} remaining: {} {} returned {}",
                    report.delivered,
                    report.remaining,
                    entry.method,
                    entry.url,
                    status.as_u16()
                )));
            }

            self.db.remove_outbox(entry.id).await?;
            report.remaining -= 1;
            if status.is_success() {
                report.delivered += 1;
            } else {
                tracing::warn!(id = entry.id, url = %entry.url, status = status.as_u16(), "dropping rejected outbox entry");
                report.dropped += 1;
            }
        }

        tracing::info!(delivered = report.delivered, dropped = report.dropped, "outbox flushed");
        Ok(report)
    }
}

impl Worker {
    /// React to a background sync signal.
    ///
    /// Returns None for tags this worker does not own.
    pub async fn handle_sync(&self, tag: &str) -> Result<Option<SyncReport>, Error> {
        if tag != self.config.sync_tag {
            tracing::debug!(tag, "ignoring unknown sync tag");
            return Ok(None);
        }

        tracing::info!(tag, "syncing queued writes");
        self.sync.flush().await.map(Some)
    }
}
