//! Shared configuration types.

use serde::{Deserialize, Serialize};

use crate::error::ConnectorResult;

/// Trait for collaborator-specific configuration.
pub trait CollaboratorConfig {
    /// Validate required fields and value ranges.
    fn validate(&self) -> ConnectorResult<()>;
}

/// Transport settings shared across collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Connection timeout in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connection_timeout_secs: default_connection_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_settings_defaults() {
        let settings: ConnectionSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ConnectionSettings::default());
        assert_eq!(settings.connection_timeout_secs, 30);
    }
}
