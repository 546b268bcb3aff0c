//! Worker wired to an in-memory database and a scripted network.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use swcache_client::fetch::{Network, Request, Response, StatusCode};
use swcache_client::{LoggingHost, Worker, WorkerConfig};
use swcache_core::{AppConfig, CacheDb, Error};

/// Answers 200 for every URL, echoing the path as the body, until switched offline.
#[derive(Default)]
pub(crate) struct StubNetwork {
    offline: AtomicBool,
}

impl StubNetwork {
    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: Request) -> Result<Response, Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        let body = format!("{} {}", request.method, request.url.path());
        Ok(Response::new(request.url, StatusCode::OK, body))
    }
}

pub(crate) struct Fixture {
    pub(crate) worker: Arc<Worker>,
    pub(crate) db: CacheDb,
    pub(crate) network: Arc<StubNetwork>,
}

pub(crate) async fn fixture(manifest: &[&str]) -> Fixture {
    let config = AppConfig { manifest: manifest.iter().map(|s| s.to_string()).collect(), ..Default::default() };
    let db = CacheDb::open_in_memory().await.unwrap();
    let network = Arc::new(StubNetwork::default());
    let worker = Worker::new(
        WorkerConfig::from_app_config(&config).unwrap(),
        db.clone(),
        network.clone(),
        Arc::new(LoggingHost::new()),
    );
    Fixture { worker: Arc::new(worker), db, network }
}

/// Decode the JSON text content of a tool result.
pub(crate) fn output<T: DeserializeOwned>(result: &CallToolResult) -> T {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
