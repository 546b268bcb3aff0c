//! Fetch interception: cache first, then network, then the offline page.

use reqwest::Method;
use swcache_core::{CacheDb, Error, RequestKey, StoredResponse};

use super::{LifecycleState, Worker};
use crate::fetch::{Request, Response, ResponseSource, Storability, is_same_origin};

impl Worker {
    /// Answer a request on behalf of a client.
    ///
    /// Once the worker is active, GET requests are served from the current
    /// generation when possible. A miss goes to the network and a successful
    /// same-origin answer is stored in the background. When the network is
    /// unreachable the stored offline page is served, or a synthesized 503
    /// if there is none. Other fetch failures, such as an oversized body,
    /// are returned to the caller.
    ///
    /// Anything else (non-GET, or a worker that is not active yet) goes
    /// straight to the network uncached, and transport errors are returned.
    pub async fn handle_fetch(&self, request: Request) -> Result<Response, Error> {
        if request.method != Method::GET || self.state().await != LifecycleState::Active {
            tracing::debug!(method = %request.method, url = %request.url, "passing through");
            return self.network.fetch(request).await;
        }

        let key = request.key();
        if let Some(response) = self.lookup(&request, &key).await {
            tracing::debug!(url = %request.url, "cache hit");
            return Ok(response);
        }
        tracing::debug!(url = %request.url, "cache miss");

        let url = request.url.clone();
        let response = match self.network.fetch(request.clone()).await {
            Ok(response) => response,
            Err(e) if !e.is_network() => return Err(e),
            Err(e) => {
                tracing::debug!(%url, error = %e, "network unavailable, serving fallback");
                return Ok(self.offline_fallback(&request).await);
            }
        };

        match response.storability() {
            Storability::Storable if is_same_origin(&self.config.origin, &url) => {
                store_detached(self.db.clone(), self.config.cache_name.clone(), key, response.to_stored());
            }
            Storability::Storable => tracing::debug!(%url, "not storing cross-origin response"),
            Storability::Opaque => tracing::debug!(%url, "not storing opaque response"),
            Storability::NotOk(status) => tracing::debug!(%url, status = status.as_u16(), "not storing response"),
        }

        Ok(response)
    }

    /// Cached response for `key`. Read failures count as a miss.
    async fn lookup(&self, request: &Request, key: &RequestKey) -> Option<Response> {
        let stored = match self.db.match_entry(&self.config.cache_name, key).await {
            Ok(stored) => stored?,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache read failed");
                return None;
            }
        };

        match Response::from_stored(request.url.clone(), stored, ResponseSource::Cache) {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "ignoring unreadable cache entry");
                None
            }
        }
    }

    async fn offline_fallback(&self, request: &Request) -> Response {
        let key = RequestKey::get(self.config.offline_page.as_str());
        match self.db.match_entry(&self.config.cache_name, &key).await {
            Ok(Some(stored)) => {
                match Response::from_stored(self.config.offline_page.clone(), stored, ResponseSource::OfflinePage) {
                    Ok(page) => return page,
                    Err(e) => tracing::warn!(error = %e, "ignoring unreadable offline page"),
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "offline page lookup failed"),
        }
        Response::service_unavailable(request.url.clone())
    }
}

/// Write a response into a generation without waiting for it.
///
/// Failures are logged; the caller already has its response.
fn store_detached(db: CacheDb, generation: String, key: RequestKey, response: StoredResponse) {
    tokio::spawn(async move {
        let result = match db.open_generation(&generation).await {
            Ok(cache) => cache.put(&key, &response).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => tracing::debug!(url = %key.url, %generation, "stored network response"),
            Err(e) => tracing::warn!(url = %key.url, %generation, error = %e, "failed to store network response"),
        }
    });
}
