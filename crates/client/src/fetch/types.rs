//! Request and response values passed between the worker, the network
//! and the cache.

use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use schemars::JsonSchema;
use serde::Serialize;
use swcache_core::{Error, RequestKey, StoredResponse};
use url::Url;

/// Body served when the network is down and no offline page is stored.
pub const OFFLINE_BODY: &str = "Offline - Please check your connection";

/// An outgoing request. Cloning duplicates it; sending consumes it.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: HeaderMap::new(), body: None }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Cache identity: method plus URL. The body is never part of it.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.as_str(), self.url.as_str())
    }
}

/// How the response relates to the worker origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// Same origin.
    Basic,
    /// Cross-origin with CORS approval.
    Cors,
    /// Cross-origin without CORS approval; returned but never cached.
    Opaque,
}

/// Where a response handed back to the caller came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    OfflinePage,
    Synthesized,
}

/// Whether a network response may be written to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storability {
    Storable,
    Opaque,
    NotOk(StatusCode),
}

#[derive(Debug, Clone)]
pub struct Response {
    pub url: Url,
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub kind: ResponseKind,
    pub source: ResponseSource,
}

impl Response {
    /// A same-origin network response with the canonical status text.
    pub fn new(url: Url, status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            url,
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: HeaderMap::new(),
            body: body.into(),
            kind: ResponseKind::Basic,
            source: ResponseSource::Network,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    /// The `503 Service Unavailable` answer for an unreachable network.
    pub fn service_unavailable(url: Url) -> Self {
        let mut response = Self::new(url, StatusCode::SERVICE_UNAVAILABLE, OFFLINE_BODY)
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        response.source = ResponseSource::Synthesized;
        response
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Only a 200 that is not opaque may be cached.
    pub fn storability(&self) -> Storability {
        if self.kind == ResponseKind::Opaque {
            Storability::Opaque
        } else if self.status != StatusCode::OK {
            Storability::NotOk(self.status)
        } else {
            Storability::Storable
        }
    }

    /// Copy into the persisted representation.
    pub fn to_stored(&self) -> StoredResponse {
        StoredResponse {
            status: self.status.as_u16(),
            status_text: self.status_text.clone(),
            headers: self
                .headers
                .iter()
                .map(|(name, value)| (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
                .collect(),
            body: self.body.to_vec(),
        }
    }

    /// Rebuild a response from a cache entry.
    pub fn from_stored(url: Url, stored: StoredResponse, source: ResponseSource) -> Result<Self, Error> {
        let status = StatusCode::from_u16(stored.status)
            .map_err(|_| Error::CorruptEntry(format!("{url}: status {}", stored.status)))?;

        let mut headers = HeaderMap::with_capacity(stored.headers.len());
        for (name, value) in &stored.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::CorruptEntry(format!("{url}: header {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::CorruptEntry(format!("{url}: header {name}: {e}")))?;
            headers.append(name, value);
        }

        Ok(Self {
            url,
            status,
            status_text: stored.status_text,
            headers,
            body: Bytes::from(stored.body),
            kind: ResponseKind::Basic,
            source,
        })
    }
}
