//! sw_fetch tool implementation.
//!
//! Runs a request through the worker's fetch interception and reports where
//! the answer came from.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use swcache_client::fetch::header::{HeaderName, HeaderValue};
use swcache_client::fetch::{Method, Request, ResponseKind, ResponseSource, resolve};
use swcache_client::{Event, EventOutcome, Worker};
use swcache_core::Error;

use super::json_result;
use crate::error::ToolError;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the worker origin.
    pub url: String,

    /// HTTP method (default: GET). Only GET requests are cached.
    #[serde(default = "default_method")]
    pub method: String,

    /// Request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request body as text.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub source: ResponseSource,
    pub kind: ResponseKind,
    pub content_type: Option<String>,
    pub headers: BTreeMap<String, String>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub bytes: usize,
}

pub(crate) fn build_request(
    worker: &Worker, url: &str, method: &str, headers: &BTreeMap<String, String>, body: Option<String>,
) -> Result<Request, McpError> {
    if url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }
    let url = resolve(&worker.config().origin, url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|e| ToolError::InvalidInput(format!("method {method:?}: {e}")))?;

    let mut request = Request::new(method, url);
    for (name, value) in headers {
        let name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ToolError::InvalidInput(format!("header {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value).map_err(|e| ToolError::InvalidInput(format!("header {name}: {e}")))?;
        request = request.with_header(name, value);
    }
    if let Some(body) = body {
        request = request.with_body(body);
    }
    Ok(request)
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &Worker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(worker, &params.url, &params.method, &params.headers, params.body)?;

    let response = match worker.dispatch(Event::Fetch(request)).await? {
        EventOutcome::Responded(response) => response,
        _ => return Err(McpError::internal_error("fetch produced no response", None)),
    };

    let output = SwFetchOutput {
        url: response.url.to_string(),
        status: response.status.as_u16(),
        status_text: response.status_text.clone(),
        source: response.source,
        kind: response.kind,
        content_type: response.content_type().map(str::to_string),
        headers: response
            .headers
            .iter()
            .map(|(name, value)| (name.to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
            .collect(),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        bytes: response.body.len(),
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{fixture, output};
    use serde_json::Value;

    fn params(url: &str) -> SwFetchParams {
        SwFetchParams { url: url.into(), method: default_method(), headers: BTreeMap::new(), body: None }
    }

    #[tokio::test]
    async fn test_fetch_relative_path_from_cache() {
        let f = fixture(&["/", "/offline.html"]).await;
        f.worker.install().await.unwrap();
        f.worker.activate().await.unwrap();

        let out: Value = output(&fetch_impl(&f.worker, params("/")).await.unwrap());

        assert_eq!(out["url"], "http://localhost:3000/");
        assert_eq!(out["status"], 200);
        assert_eq!(out["source"], "cache");
        assert_eq!(out["body"], "GET /");
    }

    #[tokio::test]
    async fn test_fetch_offline_falls_back() {
        let f = fixture(&["/offline.html"]).await;
        f.worker.install().await.unwrap();
        f.worker.activate().await.unwrap();
        f.network.set_offline(true);

        let out: Value = output(&fetch_impl(&f.worker, params("/dashboard")).await.unwrap());
        assert_eq!(out["source"], "offline_page");
        assert_eq!(out["body"], "GET /offline.html");
    }

    #[tokio::test]
    async fn test_fetch_post_passes_through() {
        let f = fixture(&[]).await;
        let p = SwFetchParams { method: "post".into(), body: Some("{}".into()), ..params("/api/posts") };

        let out: Value = output(&fetch_impl(&f.worker, p).await.unwrap());
        assert_eq!(out["source"], "network");
        assert_eq!(out["body"], "POST /api/posts");
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_input() {
        let f = fixture(&[]).await;

        assert!(fetch_impl(&f.worker, params("")).await.is_err());
        assert!(fetch_impl(&f.worker, params("ftp://example.com/file")).await.is_err());

        let mut headers = BTreeMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        let err = fetch_impl(&f.worker, SwFetchParams { headers, ..params("/") }).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
