//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Define the exchange log the dispatcher reports outcomes through
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level configurable through `RUST_LOG`
//! - Exactly one outcome event per request; store failures are separate events

use std::time::Duration;

use axum::http::{Method, StatusCode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::capture::{CacheKey, StoreError};

const DEFAULT_FILTER: &str = "capture_proxy=info,tower_http=info";

/// Install the global tracing subscriber.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// How a request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Served from the capture store.
    CacheHit,
    /// Answered by the upstream.
    Forwarded,
    /// The upstream failed or answered with an error status.
    Error,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::CacheHit => "cache",
            Outcome::Forwarded => "proxy",
            Outcome::Error => "error",
        }
    }
}

/// Store operation named in failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Read,
    Write,
}

impl StoreOp {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreOp::Read => "read",
            StoreOp::Write => "write",
        }
    }
}

/// Summary of one finished exchange.
#[derive(Debug, Clone)]
pub struct Exchange<'a> {
    pub outcome: Outcome,
    pub method: &'a Method,
    pub uri: &'a str,
    pub status: StatusCode,
    pub elapsed: Duration,
}

/// Observer the dispatcher reports to.
pub trait ExchangeLog: Send + Sync {
    /// Called once per request with its outcome.
    fn exchange(&self, exchange: &Exchange<'_>);

    /// Called when the store fails; the request itself carries on.
    fn store_failure(&self, op: StoreOp, key: &CacheKey, error: &StoreError);
}

/// [`ExchangeLog`] writing tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingExchangeLog;

impl ExchangeLog for TracingExchangeLog {
    fn exchange(&self, exchange: &Exchange<'_>) {
        let elapsed_ms = exchange.elapsed.as_millis() as u64;
        match exchange.outcome {
            Outcome::CacheHit => tracing::info!(
                outcome = exchange.outcome.as_str(),
                method = %exchange.method,
                uri = %exchange.uri,
                status = exchange.status.as_u16(),
                elapsed_ms,
                "[CACHE] {} {}", exchange.method, exchange.uri
            ),
            Outcome::Forwarded => tracing::info!(
                outcome = exchange.outcome.as_str(),
                method = %exchange.method,
                uri = %exchange.uri,
                status = exchange.status.as_u16(),
                elapsed_ms,
                "[PROXY] {} {}", exchange.method, exchange.uri
            ),
            Outcome::Error => tracing::error!(
                outcome = exchange.outcome.as_str(),
                method = %exchange.method,
                uri = %exchange.uri,
                status = exchange.status.as_u16(),
                elapsed_ms,
                "[ERROR] {} {}", exchange.method, exchange.uri
            ),
        }
    }

    fn store_failure(&self, op: StoreOp, key: &CacheKey, error: &StoreError) {
        tracing::warn!(op = op.as_str(), key = %key, error = %error, "Capture store failure");
    }
}
