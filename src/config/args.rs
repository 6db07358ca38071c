//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::config::mode::OperatingMode;

/// Command-line arguments for the capture-proxy binary.
///
/// Every flag is optional so a config file can supply it; required values are
/// enforced by validation after all sources are merged.
#[derive(Debug, Default, Parser)]
#[command(
    name = "capture-proxy",
    version,
    about = "HTTP proxy that captures upstream responses and replays them"
)]
pub struct CliArgs {
    /// Upstream base URL requests are forwarded to.
    #[arg(
        long = "target-url",
        visible_alias = "targetUrl",
        env = "CAPTURE_PROXY_TARGET_URL",
        value_name = "URL"
    )]
    pub target_url: Option<String>,

    /// Listening port (falls back to 6001 when unparsable).
    #[arg(long, env = "CAPTURE_PROXY_PORT", value_name = "PORT")]
    pub port: Option<String>,

    /// capture-only, proxy-only or mix (case-insensitive).
    #[arg(long, env = "CAPTURE_PROXY_MODE", value_name = "MODE")]
    pub mode: Option<String>,

    /// Directory holding captured responses.
    #[arg(long = "cache-dir", env = "CAPTURE_PROXY_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Optional TOML configuration file.
    #[arg(long = "config", env = "CAPTURE_PROXY_CONFIG", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Bind address for the Prometheus metrics endpoint.
    #[arg(long = "metrics-address", value_name = "ADDR")]
    pub metrics_address: Option<String>,
}

/// Usage text printed when startup configuration is rejected.
pub fn usage() -> String {
    let mut text = String::from(
        "Usage: capture-proxy --target-url <target_url> --port <port> --mode <mode>\n\nModes:\n",
    );
    for mode in OperatingMode::ALL {
        text.push_str(&format!("  {}: {}\n", mode, mode.description()));
    }
    text
}
