//! Capture proxy library.
//!
//! An HTTP forwarding layer in front of one upstream target that can pass
//! traffic through, record upstream responses to disk, or replay recorded
//! responses instead of calling the upstream.

pub mod capture;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::{OperatingMode, ProxyConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
