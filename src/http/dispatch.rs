//! Mode dispatcher.
//!
//! # Data Flow
//! ```text
//! ProxyRequest
//!     → mix only: CacheKey → store.exists → store.read → return capture
//!     → strip Host/Connection → forwarder.forward
//!         Ok  → capture-only/mix: store.write → return response
//!         Err → return error response, never stored
//!     → ExchangeLog: one outcome event
//! ```
//!
//! # Design Decisions
//! - The mode is fixed at construction; proxy-only never touches the store
//! - A corrupt capture falls back to forwarding, and the fresh response replaces it
//! - Store write failures are logged; the client still gets the upstream response
//! - No request deduplication: concurrent misses for one key all forward, last write wins

use std::sync::Arc;
use std::time::Instant;

use axum::http::{Method, StatusCode};

use crate::capture::{CacheKey, CapturedResponse, ResponseStore};
use crate::config::OperatingMode;
use crate::http::forward::Forwarder;
use crate::http::request::ProxyRequest;
use crate::observability::metrics;
use crate::observability::{Exchange, ExchangeLog, Outcome, StoreOp};

/// Decides, per request, between the store and the upstream.
#[derive(Clone)]
pub struct Dispatcher {
    mode: OperatingMode,
    store: Arc<dyn ResponseStore>,
    forwarder: Arc<dyn Forwarder>,
    log: Arc<dyn ExchangeLog>,
}

impl Dispatcher {
    pub fn new(
        mode: OperatingMode,
        store: Arc<dyn ResponseStore>,
        forwarder: Arc<dyn Forwarder>,
        log: Arc<dyn ExchangeLog>,
    ) -> Self {
        Self {
            mode,
            store,
            forwarder,
            log,
        }
    }

    /// Answer one request.
    pub async fn handle(&self, mut request: ProxyRequest) -> CapturedResponse {
        let started = Instant::now();
        let key = CacheKey::derive(&request.uri);

        if self.mode.replays() {
            if let Some(captured) = self.lookup(&key).await {
                self.finish(Outcome::CacheHit, &request.method, &request.uri, captured.status, started);
                return captured;
            }
        }

        request.strip_hop_by_hop();
        let method = request.method.clone();
        let uri = request.uri.clone();

        match self.forwarder.forward(request).await {
            Ok(response) => {
                if self.mode.captures() {
                    if let Err(e) = self.store.write(&key, &response).await {
                        self.log.store_failure(StoreOp::Write, &key, &e);
                        metrics::record_store_failure(StoreOp::Write);
                    }
                }
                self.finish(Outcome::Forwarded, &method, &uri, response.status, started);
                response
            }
            Err(e) => {
                tracing::debug!(uri = %uri, error = %e, "Upstream error");
                let response = e.into_response();
                self.finish(Outcome::Error, &method, &uri, response.status, started);
                response
            }
        }
    }

    /// Stored capture for `key`, if present and readable.
    async fn lookup(&self, key: &CacheKey) -> Option<CapturedResponse> {
        if !self.store.exists(key).await {
            return None;
        }
        match self.store.read(key).await {
            Ok(captured) => Some(captured),
            Err(e) => {
                self.log.store_failure(StoreOp::Read, key, &e);
                metrics::record_store_failure(StoreOp::Read);
                None
            }
        }
    }

    fn finish(&self, outcome: Outcome, method: &Method, uri: &str, status: StatusCode, started: Instant) {
        self.log.exchange(&Exchange {
            outcome,
            method,
            uri,
            status,
            elapsed: started.elapsed(),
        });
        metrics::record_exchange(outcome, status.as_u16(), started);
    }
}
