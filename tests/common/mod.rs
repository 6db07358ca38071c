//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use tokio::net::TcpListener;

use capture_proxy::config::{OperatingMode, ProxyConfig};
use capture_proxy::{HttpServer, Shutdown};

/// What the mock upstream observed.
#[derive(Default)]
pub struct Seen {
    pub calls: AtomicU32,
    pub headers: Mutex<Vec<HeaderMap>>,
    pub bodies: Mutex<Vec<Bytes>>,
}

impl Seen {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Start a mock upstream answering every request with `status` and `body`.
pub async fn start_upstream(status: u16, body: &'static str) -> (SocketAddr, Arc<Seen>) {
    let seen = Arc::new(Seen::default());
    let state = seen.clone();

    let app = Router::new().fallback(move |headers: HeaderMap, request_body: Bytes| {
        let state = state.clone();
        async move {
            state.calls.fetch_add(1, Ordering::SeqCst);
            state.headers.lock().unwrap().push(headers);
            state.bodies.lock().unwrap().push(request_body);
            (
                StatusCode::from_u16(status).unwrap(),
                [("content-type", "application/json"), ("x-upstream", "mock")],
                body,
            )
                .into_response()
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, seen)
}

/// An address nobody listens on.
pub fn dead_address() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// A running proxy; dropping it leaves the server task to end with the test runtime.
pub struct Proxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl Proxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a proxy in `mode` in front of `target`, storing captures in `cache_dir`.
pub async fn start_proxy(mode: OperatingMode, target: SocketAddr, cache_dir: &Path) -> Proxy {
    let mut config = ProxyConfig::default();
    config.mode = mode;
    config.upstream.target_url = format!("http://{}", target);
    config.store.directory = cache_dir.to_path_buf();

    capture_proxy::lifecycle::startup::prepare_store(&config)
        .await
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    Proxy { addr, shutdown }
}

/// A client that never reuses pooled connections across tests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Names of capture files in `dir`, sorted.
pub fn capture_files(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
