//! FreeIPA target configuration.

use idsync_connector::config::{CollaboratorConfig, ConnectionSettings};
use idsync_connector::error::{ConnectorError, ConnectorResult};
use secrecy::SecretString;
use serde::Deserialize;

/// Connection settings for a FreeIPA server.
#[derive(Clone, Deserialize)]
pub struct FreeIpaConfig {
    /// Host name, or a full `https://` URL.
    pub server: String,

    #[serde(default = "default_username")]
    pub username: String,

    pub password: SecretString,

    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,

    /// JSON-RPC API version sent with every call.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Name of the identity range managed by the sync.
    #[serde(default = "default_id_range_name")]
    pub id_range_name: String,

    #[serde(default)]
    pub connection: ConnectionSettings,
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_verify_ssl() -> bool {
    true
}

fn default_api_version() -> String {
    "2.251".to_string()
}

fn default_id_range_name() -> String {
    "AD_SYNC_RANGE".to_string()
}

impl FreeIpaConfig {
    pub fn new(server: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            username: default_username(),
            password: SecretString::new(password.into()),
            verify_ssl: default_verify_ssl(),
            api_version: default_api_version(),
            id_range_name: default_id_range_name(),
            connection: ConnectionSettings::default(),
        }
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Server base URL without a trailing slash.
    pub fn base_url(&self) -> String {
        let server = self.server.trim().trim_end_matches('/');
        if server.starts_with("http://") || server.starts_with("https://") {
            server.to_string()
        } else {
            format!("https://{server}")
        }
    }
}

impl CollaboratorConfig for FreeIpaConfig {
    fn validate(&self) -> ConnectorResult<()> {
        if self.server.trim().is_empty() {
            return Err(ConnectorError::invalid_configuration(
                "target.server is required",
            ));
        }
        if self.username.trim().is_empty() {
            return Err(ConnectorError::invalid_configuration(
                "target.username is required",
            ));
        }
        if url::Url::parse(&self.base_url()).is_err() {
            return Err(ConnectorError::invalid_configuration(format!(
                "target.server is not a valid host: {}",
                self.server
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for FreeIpaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreeIpaConfig")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &"***REDACTED***")
            .field("verify_ssl", &self.verify_ssl)
            .field("api_version", &self.api_version)
            .field("id_range_name", &self.id_range_name)
            .field("connection", &self.connection)
            .finish()
    }
}
