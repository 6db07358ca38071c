//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Require an upstream target and check it is a usable base URL
//! - Validate value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before any socket is bound or directory created

use std::fmt;

use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No upstream target URL was given.
    MissingTargetUrl,
    /// The target URL does not parse.
    InvalidTargetUrl { url: String, reason: String },
    /// The target URL uses a scheme the forwarder cannot speak.
    UnsupportedScheme(String),
    /// The body limit would reject every request with a body.
    ZeroBodyLimit,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingTargetUrl => write!(f, "No target URL specified."),
            ValidationError::InvalidTargetUrl { url, reason } => {
                write!(f, "Invalid target URL `{}`: {}", url, reason)
            }
            ValidationError::UnsupportedScheme(scheme) => {
                write!(f, "Unsupported target URL scheme `{}` (use http or https)", scheme)
            }
            ValidationError::ZeroBodyLimit => write!(f, "limits.max_body_size must be greater than 0"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let target = config.upstream.target_url.trim();
    if target.is_empty() {
        errors.push(ValidationError::MissingTargetUrl);
    } else {
        match Url::parse(target) {
            Ok(url) if !matches!(url.scheme(), "http" | "https") => {
                errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string()));
            }
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::InvalidTargetUrl {
                url: target.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
