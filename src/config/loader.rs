//! Configuration loading.
//!
//! Sources, lowest precedence first: built-in defaults, the optional TOML file,
//! then command-line flags and their environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::args::CliArgs;
use crate::config::mode::{InvalidMode, OperatingMode};
use crate::config::schema::{ProxyConfig, DEFAULT_PORT};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid mode. Choose one of the following: capture-only, proxy-only, mix. ({0})")]
    InvalidMode(#[from] InvalidMode),

    #[error("{}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML configuration file; missing sections keep their defaults.
fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Merge defaults, the optional config file and the command line into a
/// validated configuration.
pub fn resolve(args: &CliArgs) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &args.config_file {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    if let Some(target_url) = &args.target_url {
        config.upstream.target_url = target_url.clone();
    }
    if let Some(port) = &args.port {
        config.listener.port = parse_port(port);
    }
    if let Some(mode) = &args.mode {
        config.mode = mode.parse::<OperatingMode>()?;
    }
    if let Some(dir) = &args.cache_dir {
        config.store.directory = dir.clone();
    }
    if let Some(addr) = &args.metrics_address {
        config.observability.metrics_address = Some(addr.clone());
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a port, falling back to [`DEFAULT_PORT`] on anything unusable.
pub fn parse_port(raw: &str) -> u16 {
    match raw.trim().parse::<u16>() {
        Ok(port) if port != 0 => port,
        _ => {
            tracing::warn!(port = %raw, default = DEFAULT_PORT, "Unparsable port, using default");
            DEFAULT_PORT
        }
    }
}
