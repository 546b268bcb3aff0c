//! cache_keys tool implementation.
//!
//! Lists generations and the request keys stored in one of them.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::WorkerConfig;
use swcache_core::CacheDb;

use crate::tools::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Generation to list (default: this worker's generation).
    #[serde(default)]
    pub generation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKey {
    pub method: String,
    pub url: String,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    /// Every generation in the database, oldest first.
    pub generations: Vec<String>,
    pub generation: String,
    pub installed: bool,
    pub activated: bool,
    pub keys: Vec<CacheKey>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(cache: &CacheDb, config: &WorkerConfig, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let generation = params.generation.unwrap_or_else(|| config.cache_name.clone());
    let generations = cache.generation_names().await?;
    let info = cache.generation_info(&generation).await?;
    let keys = cache
        .list_entries(&generation)
        .await?
        .into_iter()
        .map(|k| CacheKey { method: k.method, url: k.url })
        .collect();

    let output = CacheKeysOutput {
        generations,
        installed: info.as_ref().is_some_and(|i| i.is_ready()),
        activated: info.as_ref().is_some_and(|i| i.is_active()),
        generation,
        keys,
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{fixture, output};

    #[tokio::test]
    async fn test_keys_empty_database() {
        let f = fixture(&[]).await;
        let out: CacheKeysOutput =
            output(&keys_impl(&f.db, f.worker.config(), CacheKeysParams::default()).await.unwrap());

        assert!(out.generations.is_empty());
        assert_eq!(out.generation, "vibecaas-v1.0.0");
        assert!(!out.installed);
        assert!(out.keys.is_empty());
    }

    #[tokio::test]
    async fn test_keys_after_install() {
        let f = fixture(&["/", "/styles.css"]).await;
        f.worker.install().await.unwrap();
        f.worker.activate().await.unwrap();

        let out: CacheKeysOutput =
            output(&keys_impl(&f.db, f.worker.config(), CacheKeysParams::default()).await.unwrap());

        assert_eq!(out.generations, vec!["vibecaas-v1.0.0"]);
        assert!(out.installed);
        assert!(out.activated);
        let mut urls: Vec<String> = out.keys.into_iter().map(|k| k.url).collect();
        urls.sort();
        assert_eq!(urls, vec!["http://localhost:3000/", "http://localhost:3000/styles.css"]);
    }
}
