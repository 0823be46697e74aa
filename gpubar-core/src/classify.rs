//! Connection failure classification
//!
//! Maps raw failure text from the remote shell (or from output parsing) to a
//! stable [`ErrorCode`] and a human-readable message for the presentation
//! layer.

use serde::{Deserialize, Serialize};

/// Fallback message when the raw failure text is empty
pub const GENERIC_FAILURE_MESSAGE: &str = "Connection failed";

/// Stable failure category reported to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Remote shell rejected our credentials
    AuthFailed,
    /// Host key did not match `known_hosts`
    HostKey,
    /// Hostname could not be resolved
    Dns,
    /// TCP connection refused
    Refused,
    /// Connect or command timeout
    Timeout,
    /// `nvidia-smi` is not installed on the target
    NvidiaSmiMissing,
    /// Anything else, including parse failures
    Unknown,
}

impl ErrorCode {
    /// Returns the wire identifier (e.g. `auth_failed`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthFailed => "auth_failed",
            Self::HostKey => "host_key",
            Self::Dns => "dns",
            Self::Refused => "refused",
            Self::Timeout => "timeout",
            Self::NvidiaSmiMissing => "nvidia_smi_missing",
            Self::Unknown => "unknown",
        }
    }

    /// Fixed user-facing message for known categories
    const fn message(self) -> Option<&'static str> {
        match self {
            Self::AuthFailed => Some("Authentication failed. Check your SSH key or agent."),
            Self::HostKey => Some("Host key verification failed. Check ~/.ssh/known_hosts."),
            Self::Dns => Some("Could not resolve hostname."),
            Self::Refused => Some("Connection refused by the remote host."),
            Self::Timeout => Some("Connection timed out."),
            Self::NvidiaSmiMissing => Some("nvidia-smi was not found on the remote host."),
            Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// Failure category
    pub code: ErrorCode,
    /// Message suitable for display
    pub message: String,
}

/// Classifies raw failure text.
///
/// Matching is case-insensitive on the trimmed text and the first matching
/// rule wins, so `"Permission denied ... timed out"` is `auth_failed`.
#[must_use]
pub fn classify(raw: &str) -> Classified {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();

    let code = if lower.contains("permission denied") {
        ErrorCode::AuthFailed
    } else if lower.contains("host key verification failed") {
        ErrorCode::HostKey
    } else if lower.contains("could not resolve hostname") {
        ErrorCode::Dns
    } else if lower.contains("connection refused") {
        ErrorCode::Refused
    } else if lower.contains("timed out") {
        ErrorCode::Timeout
    } else if lower.contains("nvidia-smi")
        && (lower.contains("not found") || lower.contains("command not found"))
    {
        ErrorCode::NvidiaSmiMissing
    } else {
        ErrorCode::Unknown
    };

    let message = code.message().map_or_else(
        || {
            if trimmed.is_empty() {
                GENERIC_FAILURE_MESSAGE.to_string()
            } else {
                trimmed.to_string()
            }
        },
        str::to_string,
    );

    Classified { code, message }
}
