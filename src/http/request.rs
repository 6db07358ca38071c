//! Inbound request handling.
//!
//! # Responsibilities
//! - Buffer the inbound request into a [`ProxyRequest`]
//! - Keep the original path + query exactly as received
//! - Strip headers that only describe the inbound connection
//!
//! # Design Decisions
//! - The body is buffered once; the same bytes are forwarded
//! - Headers are a working copy owned by the exchange
//! - Only the configured size limit maps to 413; any other body failure is
//!   the client's broken request (400)

use std::error::Error as StdError;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, Method, Request, StatusCode, Uri};
use http_body_util::LengthLimitError;

/// Headers removed before a request is forwarded upstream.
pub const STRIPPED_REQUEST_HEADERS: [HeaderName; 2] = [header::HOST, header::CONNECTION];

/// One inbound request, fully buffered.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    /// Original path + query, as received.
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Failure to buffer an inbound body.
#[derive(Debug, thiserror::Error)]
pub enum BodyReadError {
    /// The body is larger than the configured limit.
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    /// The client aborted or sent a malformed body.
    #[error("failed to read request body: {0}")]
    Read(#[source] axum::Error),
}

impl BodyReadError {
    fn classify(error: axum::Error, limit: usize) -> Self {
        if is_length_limit(&error) {
            BodyReadError::TooLarge { limit }
        } else {
            BodyReadError::Read(error)
        }
    }

    /// Status answered to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            BodyReadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            BodyReadError::Read(_) => StatusCode::BAD_REQUEST,
        }
    }
}

fn is_length_limit(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(cause) = current {
        if cause.is::<LengthLimitError>() {
            return true;
        }
        current = cause.source();
    }
    false
}

impl ProxyRequest {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Buffer `request`, reading at most `limit` body bytes.
    pub async fn from_request(
        original_uri: &Uri,
        request: Request<Body>,
        limit: usize,
    ) -> Result<Self, BodyReadError> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, limit)
            .await
            .map_err(|e| BodyReadError::classify(e, limit))?;
        Ok(Self {
            method: parts.method,
            uri: original_path_and_query(original_uri),
            headers: parts.headers,
            body,
        })
    }

    /// Remove `Host` and `Connection` from the working headers.
    pub fn strip_hop_by_hop(&mut self) {
        strip_request_headers(&mut self.headers);
    }
}

/// Path + query of `uri`, `/` when it has neither.
pub fn original_path_and_query(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

/// Remove `Host` and `Connection` from `headers`.
pub fn strip_request_headers(headers: &mut HeaderMap) {
    for name in &STRIPPED_REQUEST_HEADERS {
        headers.remove(name);
    }
}
