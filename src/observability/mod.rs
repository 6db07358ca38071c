//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher outcomes:
//!     → logging.rs (ExchangeLog: one structured event per request)
//!     → metrics.rs (counters, histograms)
//!
//! HTTP middleware:
//!     → tower-http TraceLayer (request spans)
//!     → x-request-id generation and propagation
//! ```
//!
//! # Design Decisions
//! - Structured fields (outcome, method, uri, status) for machine parsing
//! - Logging reaches the dispatcher as an injected collaborator
//! - Metrics are cheap and optional (no recorder, no cost)

pub mod logging;
pub mod metrics;

pub use logging::{Exchange, ExchangeLog, Outcome, StoreOp, TracingExchangeLog};
