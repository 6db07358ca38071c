//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the outbound request: target base URL + original path and query
//! - Copy method, body and headers (minus `Host` and `Connection`)
//! - Normalize every result into a response or a typed upstream error
//!
//! # Design Decisions
//! - One attempt per request, no retries
//! - Statuses >= 400 are the upstream's own error payload and are relayed as is
//! - A missing response (refused, DNS, TLS, timeout, broken body) becomes a plain 500
//! - No timeout beyond the client's connect timeout
//! - Redirects are followed by the client; the final response is what gets relayed

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;

use crate::capture::CapturedResponse;
use crate::config::UpstreamConfig;
use crate::http::request::{strip_request_headers, ProxyRequest};

/// Body sent when the upstream never answered.
pub const GENERIC_FAILURE_BODY: &str = "An error occurred while proxying the request.";

/// Why a forward did not produce a cacheable response.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The upstream answered with an error status; its payload is relayed.
    #[error("upstream responded with status {}", .0.status)]
    Status(CapturedResponse),

    /// No response was received at all.
    #[error("upstream request failed: {0}")]
    Transport(String),
}

impl UpstreamError {
    /// The response relayed to the client.
    pub fn into_response(self) -> CapturedResponse {
        match self {
            UpstreamError::Status(response) => response,
            UpstreamError::Transport(_) => CapturedResponse {
                status: axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                headers: Default::default(),
                body: Bytes::from_static(GENERIC_FAILURE_BODY.as_bytes()),
            },
        }
    }
}

/// Sends a request to the upstream target.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, request: ProxyRequest) -> Result<CapturedResponse, UpstreamError>;
}

/// [`Forwarder`] backed by a `reqwest` client (plain HTTP and HTTPS targets).
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
    target: String,
}

impl HttpForwarder {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            target: config.target_url.trim().to_string(),
        })
    }

    /// Outbound URL for an original path + query.
    fn upstream_url(&self, original: &str) -> String {
        format!("{}{}", self.target, original)
    }

    fn build_request(&self, request: ProxyRequest) -> Result<reqwest::Request, UpstreamError> {
        let url = self.upstream_url(&request.uri);
        let mut headers = request.headers;
        strip_request_headers(&mut headers);

        self.client
            .request(request.method, &url)
            .headers(headers)
            .body(request.body)
            .build()
            .map_err(|e| {
                UpstreamError::Transport(format!("invalid upstream request {}: {}", url, describe(&e)))
            })
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, request: ProxyRequest) -> Result<CapturedResponse, UpstreamError> {
        let outbound = self.build_request(request)?;

        let response = self
            .client
            .execute(outbound)
            .await
            .map_err(|e| UpstreamError::Transport(describe(&e)))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(describe(&e)))?;

        let captured = CapturedResponse::from_parts(status, &headers, body);
        if status.is_client_error() || status.is_server_error() {
            Err(UpstreamError::Status(captured))
        } else {
            Ok(captured)
        }
    }
}

/// Flatten an error and its sources into one line.
fn describe(error: &(dyn std::error::Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
