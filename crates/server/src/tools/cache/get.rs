//! cache_get tool implementation.
//!
//! Retrieves a stored response by request URL.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::WorkerConfig;
use swcache_client::fetch::resolve;
use swcache_core::{CacheDb, Error, RequestKey};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL, or a path resolved against the worker origin.
    pub url: String,

    /// Generation to read (default: this worker's generation).
    #[serde(default)]
    pub generation: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub generation: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub bytes: usize,
    pub stored_at: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(cache: &CacheDb, config: &WorkerConfig, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }
    let url = resolve(&config.origin, &params.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let generation = params.generation.unwrap_or_else(|| config.cache_name.clone());

    let entry = cache
        .get_entry(&generation, &RequestKey::get(url.as_str()))
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{url} in {generation}")))?;

    let response = entry.response;
    let output = CacheGetOutput {
        generation: entry.generation,
        method: entry.key.method,
        url: entry.key.url,
        status: response.status,
        content_type: response.content_type().map(str::to_string),
        status_text: response.status_text,
        bytes: response.body.len(),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        headers: response.headers,
        stored_at: entry.stored_at,
    };

    json_result(&output)
}
