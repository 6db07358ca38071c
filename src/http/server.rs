//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing, CORS)
//! - Build the dispatcher from configuration
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{OriginalUri, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::capture::FileStore;
use crate::config::ProxyConfig;
use crate::http::dispatch::Dispatcher;
use crate::http::forward::HttpForwarder;
use crate::http::request::ProxyRequest;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::TracingExchangeLog;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub max_body_size: usize,
}

/// HTTP server for the capture proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server wired to the file store and the HTTP forwarder.
    ///
    /// The store directory is not created here; see
    /// [`crate::lifecycle::startup::prepare_store`]. Fails only when the
    /// upstream client cannot be built (TLS backend initialization).
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let dispatcher = Dispatcher::new(
            config.mode,
            Arc::new(FileStore::new(config.store.directory.clone())),
            Arc::new(HttpForwarder::new(&config.upstream)?),
            Arc::new(TracingExchangeLog),
        );
        Ok(Self::with_dispatcher(config, dispatcher))
    }

    fn with_dispatcher(config: ProxyConfig, dispatcher: Dispatcher) -> Self {
        let state = AppState {
            dispatcher: Arc::new(dispatcher),
            max_body_size: config.limits.max_body_size,
        };
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(CorsLayer::permissive()),
            )
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mode = %self.config.mode,
            target = %self.config.upstream.target_url,
            "Capture proxy listening"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: buffer the request and hand it to the dispatcher.
///
/// Oversized bodies get 413, bodies the client failed to deliver get 400.
async fn proxy_handler(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    request: Request<Body>,
) -> Response {
    let request = match ProxyRequest::from_request(&original_uri, request, state.max_body_size).await {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(uri = %original_uri, error = %e, "Rejecting request body");
            return (e.status(), e.to_string()).into_response();
        }
    };

    state.dispatcher.handle(request).await.into_response()
}
