//! Response relay.
//!
//! # Responsibilities
//! - Turn a captured or forwarded response into the client response
//! - Drop connection-level framing headers, `content-length` included; hyper
//!   recomputes framing for the buffered body, which may differ from what the
//!   upstream sent when a capture was edited by hand
//!
//! # Design Decisions
//! - Status, end-to-end headers and body are relayed unchanged
//! - Header entries that are not valid HTTP are skipped, not fatal

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Response};
use axum::response::IntoResponse;

use crate::capture::CapturedResponse;

/// Headers describing a single transport leg or the framing of one message.
const FRAMING_HEADERS: [&str; 8] = [
    "connection",
    "content-length",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_framing(name: &str) -> bool {
    FRAMING_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h))
}

impl IntoResponse for CapturedResponse {
    fn into_response(self) -> axum::response::Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            if is_framing(name) {
                continue;
            }
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::debug!(header = %name, "Skipping header that is not valid HTTP"),
            }
        }

        response
    }
}
