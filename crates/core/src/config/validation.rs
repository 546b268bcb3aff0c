//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;
use url::Url;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

/// Parse an http(s) origin: a host, optionally a port, and no path beyond `/`.
fn parse_origin(origin: &str) -> Option<Url> {
    let url = Url::parse(origin.trim()).ok()?;
    let is_origin = matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some_and(|h| !h.is_empty())
        && url.path() == "/"
        && url.query().is_none()
        && url.fragment().is_none()
        && url.username().is_empty()
        && url.password().is_none();
    is_origin.then_some(url)
}

/// An asset is either an origin-relative path or an absolute URL on `origin`.
fn is_asset_reference(entry: &str, origin: &Url) -> bool {
    if entry.starts_with('/') {
        return origin.join(entry).is_ok();
    }
    Url::parse(entry).is_ok_and(|url| url.origin() == origin.origin())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `app_name` is empty or contains whitespace
    /// - `version` is not semver
    /// - `origin` is not an http(s) origin
    /// - a `manifest` entry or `offline_page` is neither a path nor a URL on `origin`
    /// - `sync_tag` or `user_agent` is empty
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.is_empty() || self.app_name.chars().any(char::is_whitespace) {
            return Err(invalid("app_name", "must be non-empty without whitespace"));
        }

        if let Err(e) = semver::Version::parse(&self.version) {
            return Err(invalid("version", format!("not a semantic version: {e}")));
        }

        let Some(origin) = parse_origin(&self.origin) else {
            return Err(invalid("origin", "must be an http(s) origin without a path"));
        };

        if let Some(bad) = self.manifest.iter().find(|e| !is_asset_reference(e, &origin)) {
            return Err(invalid("manifest", format!("entry {bad:?} is not a same-origin path or URL")));
        }

        if !is_asset_reference(&self.offline_page, &origin) {
            return Err(invalid("offline_page", "must be a same-origin path or URL"));
        }

        if self.sync_tag.is_empty() {
            return Err(invalid("sync_tag", "must not be empty"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if !self.manifest.contains(&self.offline_page) {
            tracing::warn!(
                offline_page = %self.offline_page,
                manifest_len = self.manifest.len(),
                "offline_page is not in the manifest; network failures will fall back to a synthesized 503"
            );
        }

        Ok(())
    }
}
