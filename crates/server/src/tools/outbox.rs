//! outbox_enqueue tool implementation.
//!
//! Queues a write made while offline; sw_sync replays it later.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use swcache_client::Worker;
use swcache_core::CacheDb;

use super::fetch::build_request;
use super::json_result;

/// Parameters for the outbox_enqueue tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OutboxEnqueueParams {
    /// HTTP method of the write, e.g. POST.
    pub method: String,

    /// Absolute URL, or a path resolved against the worker origin.
    pub url: String,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OutboxEnqueueOutput {
    pub id: i64,
    /// Entries waiting for the next sync, including this one.
    pub pending: usize,
}

/// Implementation of the outbox_enqueue tool.
pub async fn enqueue_impl(
    cache: &CacheDb, worker: &Worker, params: OutboxEnqueueParams,
) -> Result<CallToolResult, McpError> {
    let request = build_request(worker, &params.url, &params.method, &params.headers, None)?;

    let headers = params.headers.into_iter().collect();
    let body = params.body.map(String::into_bytes);
    let id = cache
        .enqueue_outbox(request.method.as_str(), request.url.as_str(), headers, body)
        .await?;
    let pending = cache.pending_outbox().await?.len();

    tracing::info!(id, method = %request.method, url = %request.url, "queued offline write");
    json_result(&OutboxEnqueueOutput { id, pending })
}
