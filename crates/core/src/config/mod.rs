//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name, used as the cache generation prefix.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Human-readable title shown on notifications.
    #[serde(default = "default_app_title")]
    pub app_title: String,

    /// Deployed version (semver). Each version owns one cache generation.
    ///
    /// Set via SWCACHE_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Origin the worker serves; only same-origin responses are cached.
    ///
    /// Set via SWCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Assets that must be stored before a generation is ready.
    /// Paths are resolved against `origin`.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Document served when the network is unreachable.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Background sync tag that triggers an outbox flush.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    /// Notification icon.
    #[serde(default = "default_icon")]
    pub icon: String,

    /// Notification badge and action icon.
    #[serde(default = "default_badge")]
    pub badge: String,

    /// Path to SQLite cache database.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Run install (and activate) when the host boots.
    #[serde(default = "default_true")]
    pub install_on_start: bool,
}

fn default_app_name() -> String {
    "vibecaas".into()
}

fn default_app_title() -> String {
    "VibeCaaS".into()
}

fn default_version() -> String {
    "1.0.0".into()
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_manifest() -> Vec<String> {
    ["/", "/index.html", "/styles.css", "/app.js", "/manifest.json", "/offline.html"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_sync_tag() -> String {
    "sync-posts".into()
}

fn default_icon() -> String {
    "/icons/icon-192.png".into()
}

fn default_badge() -> String {
    "/icons/icon-72.png".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            app_title: default_app_title(),
            version: default_version(),
            origin: default_origin(),
            manifest: default_manifest(),
            offline_page: default_offline_page(),
            sync_tag: default_sync_tag(),
            icon: default_icon(),
            badge: default_badge(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            install_on_start: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Name of the cache generation owned by this version: `<app_name>-v<version>`.
    pub fn cache_name(&self) -> String {
        format!("{}-v{}", self.app_name, self.version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed,
    /// or if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// The layered provider stack used by [`AppConfig::load`].
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.app_name, "vibecaas");
        assert_eq!(config.version, "1.0.0");
        assert_eq!(config.origin, "http://localhost:3000");
        assert_eq!(config.manifest.len(), 6);
        assert_eq!(config.manifest[0], "/");
        assert_eq!(config.offline_page, "/offline.html");
        assert_eq!(config.sync_tag, "sync-posts");
        assert_eq!(config.db_path, PathBuf::from("./swcache.sqlite"));
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert!(config.install_on_start);
    }

    #[test]
    fn test_cache_name() {
        let config = AppConfig::default();
        assert_eq!(config.cache_name(), "vibecaas-v1.0.0");

        let config = AppConfig { app_name: "demo".into(), version: "2.1.0-beta.1".into(), ..Default::default() };
        assert_eq!(config.cache_name(), "demo-v2.1.0-beta.1");
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_env_overrides_toml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "swcache.toml",
                r#"
                version = "1.1.0"
                origin = "https://app.example.com"
                manifest = ["/", "/offline.html"]
                "#,
            )?;
            jail.set_env("SWCACHE_CONFIG_FILE", "swcache.toml");
            jail.set_env("SWCACHE_VERSION", "1.2.0");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.version, "1.2.0");
            assert_eq!(config.origin, "https://app.example.com");
            assert_eq!(config.manifest, vec!["/", "/offline.html"]);
            assert_eq!(config.cache_name(), "vibecaas-v1.2.0");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_version() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SWCACHE_VERSION", "one");
            let result = AppConfig::load();
            assert!(matches!(result, Err(ConfigError::Invalid { ref field, .. }) if field == "version"));
            Ok(())
        });
    }
}
