//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (buffer body, keep original path + query)
//!     → dispatch.rs (mode decides: store lookup, forward, store write)
//!     → forward.rs (upstream call, error normalization)
//!     → response.rs (relay status, headers, body)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::Dispatcher;
pub use forward::{Forwarder, HttpForwarder, UpstreamError};
pub use request::ProxyRequest;
pub use server::HttpServer;
