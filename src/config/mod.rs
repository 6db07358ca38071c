//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional TOML file (loader.rs)
//!     → CLI flags / env (args.rs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → passed by value into the server and dispatcher
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never changes afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod args;
pub mod loader;
pub mod mode;
pub mod schema;
pub mod validation;

pub use args::CliArgs;
pub use loader::{resolve, ConfigError};
pub use mode::OperatingMode;
pub use schema::{ListenerConfig, ProxyConfig, StoreConfig, UpstreamConfig};
