//! swcache server entry point.
//!
//! Boots the offline cache worker and serves its lifecycle hooks as MCP tools
//! on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use std::sync::Arc;
use swcache_client::{Event, FetchClient, FetchConfig, LifecycleState, LoggingHost, Worker, WorkerConfig};
use swcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

/// Resume an already-active generation, or install this version when configured to.
async fn boot(worker: &Worker, config: &AppConfig) -> Result<()> {
    let state = worker.resume().await?;
    if state == LifecycleState::Active || !config.install_on_start {
        tracing::info!(cache = worker.cache_name(), %state, "worker ready");
        return Ok(());
    }

    match worker.dispatch(Event::Install).await {
        Ok(_) => tracing::info!(cache = worker.cache_name(), state = %worker.state().await, "worker ready"),
        // Tools stay available; sw_install can retry once the origin is reachable.
        Err(e) => tracing::warn!(cache = worker.cache_name(), error = %e, "startup install failed"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!(cache = %config.cache_name(), origin = %config.origin, db = %config.db_path.display(), "Starting swcache server on stdio transport");

    let db = CacheDb::open(&config.db_path).await.context("opening cache database")?;
    let network = Arc::new(FetchClient::new(FetchConfig::from_app_config(&config)?)?);
    let host = Arc::new(LoggingHost::new());
    let worker = Arc::new(Worker::new(WorkerConfig::from_app_config(&config)?, db.clone(), network, host));

    boot(&worker, &config).await?;

    let handler = handler::SwCacheServer::new(worker, db);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
