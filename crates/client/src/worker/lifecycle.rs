//! Install, activate and control messages.

use futures_util::future::try_join_all;
use schemars::JsonSchema;
use serde::Serialize;
use std::sync::atomic::Ordering;
use swcache_core::{Error, RequestKey, StoredResponse};
use url::Url;

use super::{LifecycleState, Worker};
use crate::fetch::{Request, Response, ResponseKind};

/// Control message action that requests immediate activation.
pub const SKIP_WAITING: &str = "skipWaiting";

/// What an activation cleaned up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ActivationReport {
    /// Generations removed, in listing order.
    pub deleted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// Skip-waiting recorded; `activation` is set when the worker was waiting.
    SkipWaiting { activation: Option<ActivationReport> },
    Ignored,
}

async fn fetch_asset(worker: &Worker, url: &Url) -> Result<(RequestKey, StoredResponse), Error> {
    let install_error = |reason: String| Error::Install { url: url.to_string(), reason };

    let request = Request::get(url.clone());
    let key = request.key();
    let response: Response = worker.network.fetch(request).await.map_err(|e| install_error(e.to_string()))?;

    if !response.status.is_success() {
        return Err(install_error(format!("status {}", response.status.as_u16())));
    }
    if response.kind == ResponseKind::Opaque {
        return Err(install_error("opaque response".into()));
    }

    tracing::debug!(%url, bytes = response.body.len(), "fetched manifest asset");
    Ok((key, response.to_stored()))
}

impl Worker {
    /// Pick up where a previous process left off.
    ///
    /// A generation that was already activated makes the worker `Active`
    /// without reinstalling.
    pub async fn resume(&self) -> Result<LifecycleState, Error> {
        let info = self.db.generation_info(&self.config.cache_name).await?;
        let mut state = self.state.write().await;
        if *state == LifecycleState::Parsed && info.is_some_and(|i| i.is_active()) {
            *state = LifecycleState::Active;
            tracing::info!(cache = %self.config.cache_name, "resumed active generation");
        }
        Ok(*state)
    }

    pub(crate) fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Populate this worker's generation with the full manifest.
    ///
    /// Every asset is fetched before anything is written, and the writes
    /// share one transaction, so a failure leaves the generation as it was.
    ///
    /// # Errors
    ///
    /// `Error::InvalidState` unless the worker is `Parsed` or `Redundant`;
    /// `Error::Install` naming the first asset that failed.
    pub async fn install(&self) -> Result<(), Error> {
        {
            let mut state = self.state.write().await;
            if !matches!(*state, LifecycleState::Parsed | LifecycleState::Redundant) {
                return Err(Error::InvalidState(format!("cannot install while {}", *state)));
            }
            *state = LifecycleState::Installing;
        }

        let cache = self.config.cache_name.clone();
        tracing::info!(%cache, assets = self.config.manifest.len(), "installing");

        match self.install_manifest().await {
            Ok(()) => {
                self.skip_waiting.store(true, Ordering::SeqCst);
                *self.state.write().await = LifecycleState::Waiting;
                tracing::info!(%cache, "installed");
                Ok(())
            }
            Err(e) => {
                *self.state.write().await = LifecycleState::Redundant;
                tracing::warn!(%cache, error = %e, "install failed");
                Err(e)
            }
        }
    }

    async fn install_manifest(&self) -> Result<(), Error> {
        let cache = self.config.cache_name.as_str();
        let storage_error = |e: Error| Error::Install {
            url: self.config.origin.to_string(),
            reason: format!("cache {cache}: {e}"),
        };

        let generation = self.db.open_generation(cache).await.map_err(storage_error)?;
        let entries = try_join_all(self.config.manifest.iter().map(|url| fetch_asset(self, url))).await?;

        generation.put_all(entries).await.map_err(storage_error)?;
        self.db.mark_installed(cache).await.map_err(storage_error)
    }

    /// Become the current generation and delete every other one.
    ///
    /// Deletion is best effort: a generation that cannot be listed or
    /// removed is logged and left behind.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        {
            let mut state = self.state.write().await;
            if *state != LifecycleState::Waiting {
                return Err(Error::InvalidState(format!("cannot activate while {}", *state)));
            }
            *state = LifecycleState::Activating;
        }

        let current = self.config.cache_name.as_str();
        let mut report = ActivationReport::default();

        match self.db.generation_names().await {
            Ok(names) => {
                for name in names.into_iter().filter(|n| n != current) {
                    match self.db.delete_generation(&name).await {
                        Ok(true) => {
                            tracing::info!(generation = %name, "deleted old cache");
                            report.deleted.push(name);
                        }
                        Ok(false) => {}
                        Err(e) => tracing::warn!(generation = %name, error = %e, "failed to delete old cache"),
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to list caches"),
        }

        if let Err(e) = self.db.mark_activated(current).await {
            tracing::warn!(cache = current, error = %e, "failed to mark cache activated");
        }
        if let Err(e) = self.host.claim_clients().await {
            tracing::warn!(error = %e, "failed to claim clients");
        }

        *self.state.write().await = LifecycleState::Active;
        tracing::info!(cache = current, deleted = report.deleted.len(), "activated");
        Ok(report)
    }

    /// Activate if the worker is waiting. Any other state, including an
    /// activation already under way, is left alone and yields `None`.
    pub(crate) async fn activate_if_waiting(&self) -> Result<Option<ActivationReport>, Error> {
        match self.activate().await {
            Ok(report) => Ok(Some(report)),
            Err(Error::InvalidState(reason)) => {
                tracing::debug!(%reason, "activation skipped");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Handle a control message posted by a client.
    pub async fn handle_message(&self, message: &serde_json::Value) -> Result<MessageOutcome, Error> {
        let action = message.get("action").and_then(serde_json::Value::as_str);
        if action != Some(SKIP_WAITING) {
            tracing::debug!(%message, "ignoring message");
            return Ok(MessageOutcome::Ignored);
        }

        self.skip_waiting.store(true, Ordering::SeqCst);
        let activation = self.activate_if_waiting().await?;
        Ok(MessageOutcome::SkipWaiting { activation })
    }
}
