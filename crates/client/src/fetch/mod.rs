//! Network access for the worker.
//!
//! ### Contract
//! - [`Network::fetch`] resolves with any HTTP response, including 4xx/5xx.
//! - Transport failures (offline, DNS, timeout) resolve with `Error::Network`.
//!
//! ### Response classification
//! - Final URL on the worker origin: [`ResponseKind::Basic`]
//! - Cross-origin with a matching `Access-Control-Allow-Origin`: [`ResponseKind::Cors`]
//! - Any other cross-origin response: [`ResponseKind::Opaque`]

pub mod types;
pub mod url;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use std::time::{Duration, Instant};

pub use reqwest::{Method, StatusCode, header};
pub use types::{OFFLINE_BODY, Request, Response, ResponseKind, ResponseSource, Storability};
pub use self::url::{UrlError, is_same_origin, parse_origin, resolve};

use swcache_core::{AppConfig, Error};

/// Something that can send a request and return the response.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: Request) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Origin the worker runs on; drives [`ResponseKind`] classification.
    pub origin: Url,

    /// User agent string (default: "swcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl FetchConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = parse_origin(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            origin,
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: 5,
        })
    }
}

/// Classify a response by the URL it was finally served from.
pub fn classify(origin: &Url, final_url: &Url, headers: &HeaderMap) -> ResponseKind {
    if is_same_origin(origin, final_url) {
        return ResponseKind::Basic;
    }

    let serialized = origin.origin().ascii_serialization();
    match headers
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|v| v.to_str().ok())
    {
        Some("*") => ResponseKind::Cors,
        Some(allowed) if allowed == serialized => ResponseKind::Cors,
        _ => ResponseKind::Opaque,
    }
}

/// reqwest-backed [`Network`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn too_large(&self, len: usize) -> Error {
        Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes))
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: Request) -> Result<Response, Error> {
        let start = Instant::now();
        let Request { method, url, mut headers, body } = request;

        if !is_same_origin(&self.config.origin, &url)
            && !headers.contains_key(header::ORIGIN)
            && let Ok(value) = HeaderValue::from_str(&self.config.origin.origin().ascii_serialization())
        {
            headers.insert(header::ORIGIN, value);
        }

        let mut builder = self.http.request(method.clone(), url.clone()).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Network(format!("timeout: {}", e))
            } else {
                Error::Network(e.to_string())
            }
        })?;

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(self.too_large(len as usize));
        }

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let kind = classify(&self.config.origin, &final_url, &headers);

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        if body.len() > self.config.max_bytes {
            return Err(self.too_large(body.len()));
        }

        tracing::debug!(
            "{} {} -> {} {:?} in {}ms ({} bytes)",
            method,
            url,
            status.as_u16(),
            kind,
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Response {
            url: final_url,
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            kind,
            source: ResponseSource::Network,
        })
    }
}
