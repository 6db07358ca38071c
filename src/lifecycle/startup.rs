//! Startup orchestration.
//!
//! # Responsibilities
//! - Prepare the capture store when the mode needs it
//! - Start the metrics exporter
//! - Bind the listener last, once everything else is ready
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Configuration is validated before this module runs, so a bad mode never
//!   creates a directory

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::capture::FileStore;
use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Errors that abort startup after configuration was accepted.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to create capture directory {path}: {source}")]
    Store {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Create the store directory when the configured mode reads or writes it.
pub async fn prepare_store(config: &ProxyConfig) -> Result<Option<FileStore>, StartupError> {
    if !config.mode.uses_store() {
        tracing::debug!(mode = %config.mode, "Capture store not used");
        return Ok(None);
    }

    let store = FileStore::new(config.store.directory.clone());
    store.init().await.map_err(|source| StartupError::Store {
        path: config.store.directory.display().to_string(),
        source,
    })?;
    Ok(Some(store))
}

/// Start every subsystem and serve until `shutdown` fires.
pub async fn run(config: ProxyConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    prepare_store(&config).await?;

    if let Some(address) = &config.observability.metrics_address {
        match address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
