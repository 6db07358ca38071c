//! Operating mode selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the proxy treats the capture store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum OperatingMode {
    /// Record every successful upstream response, never replay.
    CaptureOnly,
    /// Plain pass-through, the store is never touched.
    ProxyOnly,
    /// Replay stored responses, forward and record on a miss.
    #[default]
    Mix,
}

impl OperatingMode {
    pub const ALL: [OperatingMode; 3] = [
        OperatingMode::CaptureOnly,
        OperatingMode::ProxyOnly,
        OperatingMode::Mix,
    ];

    /// Whether stored captures are served in place of the upstream.
    pub fn replays(self) -> bool {
        matches!(self, OperatingMode::Mix)
    }

    /// Whether successful upstream responses are written to the store.
    pub fn captures(self) -> bool {
        matches!(self, OperatingMode::CaptureOnly | OperatingMode::Mix)
    }

    /// Whether the store must be initialized at startup.
    pub fn uses_store(self) -> bool {
        self.replays() || self.captures()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperatingMode::CaptureOnly => "capture-only",
            OperatingMode::ProxyOnly => "proxy-only",
            OperatingMode::Mix => "mix",
        }
    }

    /// One-line description shown in the usage text.
    pub fn description(self) -> &'static str {
        match self {
            OperatingMode::CaptureOnly => {
                "Only caches responses to the file system but does not read from them."
            }
            OperatingMode::ProxyOnly => "Only hits the target URL and does not use caching.",
            OperatingMode::Mix => "Uses both caching and proxying.",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a mode string names none of the known modes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid mode `{0}`; choose one of: capture-only, proxy-only, mix")]
pub struct InvalidMode(pub String);

impl FromStr for OperatingMode {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        OperatingMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| InvalidMode(s.to_string()))
    }
}

impl TryFrom<String> for OperatingMode {
    type Error = InvalidMode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
