//! Test doubles shared by the worker tests.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{self, HeaderValue};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swcache_core::{AppConfig, CacheDb, Error, RequestKey};
use url::Url;

use crate::fetch::{Network, Request, Response, ResponseKind};
use crate::worker::{Host, Notification, RecordingHost, Worker, WorkerConfig};

pub(crate) const ORIGIN: &str = "http://localhost:3000";

struct Route {
    status: StatusCode,
    body: Bytes,
    kind: ResponseKind,
}

/// In-memory network: canned routes, a call counter and an offline switch.
/// Unrouted URLs answer 404.
pub(crate) struct FakeNetwork {
    routes: Mutex<HashMap<String, Route>>,
    oversized: Mutex<Vec<String>>,
    requested: Mutex<Vec<String>>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

fn absolute(path_or_url: &str) -> String {
    if path_or_url.starts_with("http") {
        Url::parse(path_or_url).unwrap().to_string()
    } else {
        Url::parse(ORIGIN).unwrap().join(path_or_url).unwrap().to_string()
    }
}

impl FakeNetwork {
    pub(crate) fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            oversized: Mutex::new(Vec::new()),
            requested: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
        }
    }

    pub(crate) fn route(&self, path_or_url: &str, status: StatusCode, body: &str) {
        self.route_kind(path_or_url, status, body, ResponseKind::Basic);
    }

    pub(crate) fn route_kind(&self, path_or_url: &str, status: StatusCode, body: &str, kind: ResponseKind) {
        self.routes
            .lock()
            .unwrap()
            .insert(absolute(path_or_url), Route { status, body: Bytes::copy_from_slice(body.as_bytes()), kind });
    }

    /// Answer `path_or_url` with the size-limit error a real client raises.
    pub(crate) fn route_oversized(&self, path_or_url: &str) {
        self.oversized.lock().unwrap().push(absolute(path_or_url));
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// "METHOD path" for same-origin requests, "METHOD url" otherwise.
    pub(crate) fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let target = if request.url.as_str().starts_with(ORIGIN) {
            request.url.path().to_string()
        } else {
            request.url.to_string()
        };
        self.requested
            .lock()
            .unwrap()
            .push(format!("{} {}", request.method, target));

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        if self.oversized.lock().unwrap().iter().any(|u| u == request.url.as_str()) {
            return Err(Error::FetchTooLarge(format!("{} exceeds the body limit", request.url)));
        }

        let routes = self.routes.lock().unwrap();
        let response = match routes.get(request.url.as_str()) {
            Some(route) => Response::new(request.url.clone(), route.status, route.body.clone())
                .with_header(header::CONTENT_TYPE, HeaderValue::from_static("text/html"))
                .with_kind(route.kind),
            None => Response::new(request.url.clone(), StatusCode::NOT_FOUND, "not found"),
        };
        Ok(response)
    }
}

pub(crate) struct Harness {
    pub(crate) worker: Arc<Worker>,
    pub(crate) db: CacheDb,
    pub(crate) network: Arc<FakeNetwork>,
    pub(crate) host: Arc<RecordingHost>,
}

pub(crate) fn app_config(version: &str, manifest: &[&str]) -> AppConfig {
    AppConfig {
        version: version.into(),
        origin: ORIGIN.into(),
        manifest: manifest.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

/// Worker on the default config with an empty manifest.
pub(crate) async fn harness() -> Harness {
    harness_with(app_config("1.0.0", &[])).await
}

pub(crate) async fn harness_with(config: AppConfig) -> Harness {
    let db = CacheDb::open_in_memory().await.unwrap();
    harness_on(db, Arc::new(FakeNetwork::new()), config)
}

/// Worker sharing an existing database and network, e.g. a second version.
pub(crate) fn harness_on(db: CacheDb, network: Arc<FakeNetwork>, config: AppConfig) -> Harness {
    let host = Arc::new(RecordingHost::new());
    let worker = worker_with_host(db.clone(), network.clone(), config, host.clone());
    Harness { worker, db, network, host }
}

pub(crate) fn worker_with_host(
    db: CacheDb, network: Arc<FakeNetwork>, config: AppConfig, host: Arc<dyn Host>,
) -> Arc<Worker> {
    let worker_config = WorkerConfig::from_app_config(&config).unwrap();
    Arc::new(Worker::new(worker_config, db, network, host))
}

/// Host whose clients cannot be claimed.
pub(crate) struct UnclaimableHost;

#[async_trait]
impl Host for UnclaimableHost {
    async fn claim_clients(&self) -> Result<(), Error> {
        Err(Error::InvalidState("no clients to claim".into()))
    }

    async fn show_notification(&self, _notification: &Notification) -> Result<(), Error> {
        Ok(())
    }

    async fn close_notification(&self, _tag: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn open_window(&self, _url: &Url) -> Result<(), Error> {
        Ok(())
    }
}

/// Wait for a detached store to land.
pub(crate) async fn wait_for_entry(db: &CacheDb, generation: &str, url: &str) -> bool {
    let key = RequestKey::get(url);
    for _ in 0..100 {
        if db.match_entry(generation, &key).await.unwrap().is_some() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// File-backed database that tests can make fail from a second connection.
pub(crate) struct FileDb {
    pub(crate) db: CacheDb,
    path: PathBuf,
    _dir: tempfile::TempDir,
}

pub(crate) async fn file_db() -> FileDb {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");
    let db = CacheDb::open(&path).await.unwrap();
    FileDb { db, path, _dir: dir }
}

impl FileDb {
    /// Abort every statement matching `event`, e.g. `INSERT ON entries`.
    pub(crate) async fn fail_on(&self, event: &str) {
        let name = format!("fail_{}", event.to_ascii_lowercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));
        let sql = format!("CREATE TRIGGER {name} BEFORE {event} BEGIN SELECT RAISE(ABORT, 'disk full'); END;");
        let conn = tokio_rusqlite::Connection::open(&self.path).await.unwrap();
        conn.call_unwrap(move |c| c.execute_batch(&sql)).await.unwrap();
    }
}
