//! Captured responses and their on-disk representation.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, StatusCode};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

/// A snapshot of one upstream response.
///
/// Header names are lowercased; when the upstream repeats a header the last
/// value wins. `content-length` is not kept: it belongs to the body as sent,
/// and the relay recomputes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl CapturedResponse {
    /// Build a capture from response parts.
    pub fn from_parts(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Self {
        let headers = headers
            .iter()
            .filter(|(name, _)| **name != header::CONTENT_LENGTH)
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        Self { status, headers, body }
    }
}

/// How the body is stored in the `data` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    Json,
    Text,
    Base64,
}

/// Serialized form of a capture.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CaptureFile {
    status: u16,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encoding: Option<BodyEncoding>,
}

/// Reasons a parsed capture file cannot become a [`CapturedResponse`].
#[derive(Debug, thiserror::Error)]
pub enum InvalidCapture {
    #[error("status {0} is not a valid HTTP status")]
    Status(u16),

    #[error("{0:?} encoded data must be a string")]
    NotAString(BodyEncoding),

    #[error("invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to re-serialize JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<&CapturedResponse> for CaptureFile {
    fn from(response: &CapturedResponse) -> Self {
        let (data, encoding) = encode_body(&response.body);
        Self {
            status: response.status.as_u16(),
            headers: response.headers.clone(),
            data,
            encoding: Some(encoding),
        }
    }
}

impl TryFrom<CaptureFile> for CapturedResponse {
    type Error = InvalidCapture;

    fn try_from(file: CaptureFile) -> Result<Self, Self::Error> {
        let status =
            StatusCode::from_u16(file.status).map_err(|_| InvalidCapture::Status(file.status))?;

        let body = match (file.data, file.encoding) {
            (serde_json::Value::Null, None) => Bytes::new(),
            (data, encoding) => decode_body(data, encoding)?,
        };

        // Hand-edited files may carry mixed-case names.
        let headers = file
            .headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();

        Ok(Self { status, headers, body })
    }
}

/// Pick the most readable encoding that reproduces `body` exactly.
fn encode_body(body: &[u8]) -> (serde_json::Value, BodyEncoding) {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        if serde_json::to_vec(&value).is_ok_and(|compact| compact == body) {
            return (value, BodyEncoding::Json);
        }
    }
    match std::str::from_utf8(body) {
        Ok(text) => (serde_json::Value::String(text.to_string()), BodyEncoding::Text),
        Err(_) => (
            serde_json::Value::String(BASE64.encode(body)),
            BodyEncoding::Base64,
        ),
    }
}

fn decode_body(
    data: serde_json::Value,
    encoding: Option<BodyEncoding>,
) -> Result<Bytes, InvalidCapture> {
    match (encoding, data) {
        (Some(BodyEncoding::Text) | None, serde_json::Value::String(text)) => Ok(Bytes::from(text)),
        (Some(BodyEncoding::Base64), serde_json::Value::String(encoded)) => {
            Ok(Bytes::from(BASE64.decode(encoded)?))
        }
        (Some(BodyEncoding::Json) | None, value) => Ok(Bytes::from(serde_json::to_vec(&value)?)),
        (Some(encoding), _) => Err(InvalidCapture::NotAString(encoding)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn capture(body: &'static [u8]) -> CapturedResponse {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        CapturedResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::from_static(body),
        }
    }

    fn through_file(response: &CapturedResponse) -> CapturedResponse {
        let json = serde_json::to_string(&CaptureFile::from(response)).unwrap();
        let file: CaptureFile = serde_json::from_str(&json).unwrap();
        CapturedResponse::try_from(file).unwrap()
    }

    #[test]
    fn compact_json_is_stored_as_json() {
        let response = capture(br#"{"id":1,"name":"widget"}"#);
        let file = CaptureFile::from(&response);
        assert_eq!(file.encoding, Some(BodyEncoding::Json));
        assert_eq!(file.data["name"], "widget");
        assert_eq!(through_file(&response), response);
    }

    #[test]
    fn pretty_json_keeps_its_bytes() {
        let response = capture(b"{\n  \"id\": 1\n}");
        let file = CaptureFile::from(&response);
        assert_eq!(file.encoding, Some(BodyEncoding::Text));
        assert_eq!(through_file(&response).body, response.body);
    }

    #[test]
    fn binary_body_uses_base64() {
        let response = capture(&[0xff, 0x00, 0xfe, 0x10]);
        let file = CaptureFile::from(&response);
        assert_eq!(file.encoding, Some(BodyEncoding::Base64));
        assert_eq!(through_file(&response).body, response.body);
    }

    #[test]
    fn empty_body_round_trips() {
        let response = capture(b"");
        assert_eq!(through_file(&response).body, Bytes::new());
    }

    #[test]
    fn literal_null_body_is_not_dropped() {
        let response = capture(b"null");
        assert_eq!(CaptureFile::from(&response).encoding, Some(BodyEncoding::Json));
        assert_eq!(through_file(&response).body, Bytes::from_static(b"null"));
    }

    #[test]
    fn files_without_encoding_are_accepted() {
        let object: CaptureFile = serde_json::from_str(
            r#"{"status":200,"headers":{"Content-Type":"application/json"},"data":{"ok":true}}"#,
        )
        .unwrap();
        let response = CapturedResponse::try_from(object).unwrap();
        assert_eq!(response.body, Bytes::from_static(br#"{"ok":true}"#));
        assert_eq!(response.headers["content-type"], "application/json");

        let text: CaptureFile =
            serde_json::from_str(r#"{"status":404,"data":"not here"}"#).unwrap();
        let response = CapturedResponse::try_from(text).unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, Bytes::from_static(b"not here"));

        let bare: CaptureFile = serde_json::from_str(r#"{"status":204}"#).unwrap();
        assert!(CapturedResponse::try_from(bare).unwrap().body.is_empty());
    }

    #[test]
    fn invalid_status_is_rejected() {
        let file: CaptureFile = serde_json::from_str(r#"{"status":42,"data":""}"#).unwrap();
        assert!(matches!(
            CapturedResponse::try_from(file),
            Err(InvalidCapture::Status(42))
        ));
    }

    #[test]
    fn base64_data_must_be_a_string() {
        let file: CaptureFile =
            serde_json::from_str(r#"{"status":200,"data":[1,2],"encoding":"base64"}"#).unwrap();
        assert!(matches!(
            CapturedResponse::try_from(file),
            Err(InvalidCapture::NotAString(BodyEncoding::Base64))
        ));
    }

    #[test]
    fn duplicate_headers_keep_the_last_value() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.insert("X-Trace", HeaderValue::from_static("abc"));

        let response = CapturedResponse::from_parts(StatusCode::OK, &headers, Bytes::new());
        assert_eq!(response.headers["set-cookie"], "b=2");
        assert_eq!(response.headers["x-trace"], "abc");
    }

    #[test]
    fn content_length_is_not_captured() {
        let mut headers = HeaderMap::new();
        headers.insert("content-length", HeaderValue::from_static("8"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let response =
            CapturedResponse::from_parts(StatusCode::OK, &headers, Bytes::from_static(b"{\"id\":1}"));
        assert!(!response.headers.contains_key("content-length"));
        assert_eq!(response.headers["content-type"], "application/json");
    }
}
