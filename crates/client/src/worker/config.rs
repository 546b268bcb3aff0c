//! Resolved, per-instance worker settings.

use swcache_core::{AppConfig, Error};
use url::Url;

use crate::fetch::{is_same_origin, parse_origin, resolve};

/// Notification presentation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    pub title: String,
    pub icon: String,
    pub badge: String,
}

/// Everything a [`Worker`](super::Worker) needs to know about its version.
///
/// Two workers with different configs can share one database without
/// interfering; every lookup is keyed by `cache_name`.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub cache_name: String,
    pub origin: Url,
    pub manifest: Vec<Url>,
    pub offline_page: Url,
    pub sync_tag: String,
    pub notification: NotificationConfig,
}

impl WorkerConfig {
    /// Resolve manifest paths and the offline page against the origin.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` for an unparsable origin or asset, and
    /// `Error::InvalidInput` for a manifest asset on another origin.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = parse_origin(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;

        let mut manifest = Vec::with_capacity(config.manifest.len());
        for entry in &config.manifest {
            let url = resolve(&origin, entry).map_err(|e| Error::InvalidUrl(format!("{entry}: {e}")))?;
            if !is_same_origin(&origin, &url) {
                return Err(Error::InvalidInput(format!("manifest asset {url} is not on {origin}")));
            }
            if !manifest.contains(&url) {
                manifest.push(url);
            }
        }

        let offline_page =
            resolve(&origin, &config.offline_page).map_err(|e| Error::InvalidUrl(format!("offline_page: {e}")))?;

        Ok(Self {
            cache_name: config.cache_name(),
            origin,
            manifest,
            offline_page,
            sync_tag: config.sync_tag.clone(),
            notification: NotificationConfig {
                title: config.app_title.clone(),
                icon: config.icon.clone(),
                badge: config.badge.clone(),
            },
        })
    }
}
