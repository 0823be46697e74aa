//! Remote target identification

use serde::{Deserialize, Serialize};

/// A remote host plus optional port.
///
/// An empty host means "disconnected". Port 0 means the transport default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    host: String,
    port: u16,
}

impl Target {
    /// Creates a target from caller input.
    ///
    /// The host is trimmed. Ports outside `1..=65535` normalise to 0.
    #[must_use]
    pub fn new(host: &str, port: i64) -> Self {
        Self {
            host: host.trim().to_string(),
            port: normalize_port(port),
        }
    }

    /// The disconnected target
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Host, alias or `user@host` as given
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port, 0 for the transport default
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Explicit port if one was given
    #[must_use]
    pub const fn explicit_port(&self) -> Option<u16> {
        if self.port == 0 { None } else { Some(self.port) }
    }

    /// Whether this target means "disconnected"
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.host.is_empty()
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.explicit_port() {
            Some(port) => write!(f, "{}:{port}", self.host),
            None => f.write_str(&self.host),
        }
    }
}

/// Maps caller-supplied ports onto `u16`, 0 meaning default
#[must_use]
pub fn normalize_port(port: i64) -> u16 {
    u16::try_from(port).unwrap_or(0)
}
