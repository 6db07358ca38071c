//! Cache key derivation.
//!
//! # Responsibilities
//! - Map a request's original path + query to one flat token
//! - Keep the token safe as a single file name (no separators survive)
//!
//! # Design Decisions
//! - Input is taken as received, never re-encoded
//! - Query parameter order is significant: `?a=1&b=2` and `?b=2&a=1` are distinct keys
//! - The method is not part of the key

use std::fmt;

/// Replacement for every path separator in the original URL.
const SEPARATOR_ESCAPE: &str = "__";

/// File extension appended by the store.
pub const CAPTURE_EXTENSION: &str = "json";

/// Identifier of a capture, derived from a request's original URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for an original path + query string.
    pub fn derive(original_url: &str) -> Self {
        let mut key = String::with_capacity(original_url.len() + 8);
        for c in original_url.chars() {
            if std::path::is_separator(c) {
                key.push_str(SEPARATOR_ESCAPE);
            } else {
                key.push(c);
            }
        }
        Self(key)
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the file holding this capture.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, CAPTURE_EXTENSION)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
