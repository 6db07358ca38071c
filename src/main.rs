//! Capture proxy (v1)
//!
//! An HTTP forwarding layer between a client and a single upstream target.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────┐
//!                         │                 CAPTURE PROXY                  │
//!     Client Request      │  ┌─────────┐    ┌────────────┐                 │
//!     ────────────────────┼─▶│  http   │───▶│ dispatcher │                 │
//!                         │  │ server  │    │  (mode)    │                 │
//!                         │  └─────────┘    └─────┬──────┘                 │
//!                         │                 mix   │   miss / other modes   │
//!                         │              ┌────────┴────────┐               │
//!                         │              ▼                 ▼               │
//!                         │      ┌──────────────┐   ┌────────────┐         │
//!                         │      │capture store │◀──│ forwarder  │◀────────┼──── Upstream
//!                         │      │ ./cache/*.json│   │ (reqwest)  │─────────┼───▶ Target
//!                         │      └──────────────┘   └────────────┘         │
//!                         │                                                │
//!                         │  config · observability · lifecycle            │
//!                         └───────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use clap::Parser;

use capture_proxy::config::{self, args, CliArgs};
use capture_proxy::lifecycle::{startup, Shutdown};
use capture_proxy::observability::logging;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_tracing();

    let cli = CliArgs::parse();
    let config = match config::resolve(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", args::usage());
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        mode = %config.mode,
        port = config.listener.port,
        target = %config.upstream.target_url,
        cache_dir = %config.store.directory.display(),
        "capture-proxy v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    if let Err(e) = startup::run(config, shutdown).await {
        tracing::error!(error = %e, "Fatal error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
