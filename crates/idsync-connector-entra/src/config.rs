//! Entra ID source configuration.

use idsync_connector::config::{CollaboratorConfig, ConnectionSettings};
use idsync_connector::error::{ConnectorError, ConnectorResult};
use secrecy::SecretString;
use serde::Deserialize;

/// Settings for an Entra ID tenant read through Microsoft Graph.
#[derive(Clone, Deserialize)]
pub struct EntraConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: SecretString,

    #[serde(default = "default_graph_endpoint")]
    pub graph_endpoint: String,

    #[serde(default = "default_login_endpoint")]
    pub login_endpoint: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// OData `$filter` applied when listing users.
    #[serde(default)]
    pub user_filter: Option<String>,

    /// Display names of the groups to read. Empty means all groups.
    #[serde(default)]
    pub group_names: Vec<String>,

    /// Pause between result pages.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Retries on transient Graph errors.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Login shell reported for every user.
    #[serde(default = "default_login_shell")]
    pub default_login_shell: String,

    /// Parent of the home directory reported for every user.
    #[serde(default = "default_home_base")]
    pub default_home_base: String,

    #[serde(default)]
    pub connection: ConnectionSettings,
}

fn default_graph_endpoint() -> String {
    "https://graph.microsoft.com".to_string()
}

fn default_login_endpoint() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_api_version() -> String {
    "v1.0".to_string()
}

fn default_page_delay_ms() -> u64 {
    100
}

fn default_max_retries() -> u32 {
    5
}

fn default_login_shell() -> String {
    "/bin/bash".to_string()
}

fn default_home_base() -> String {
    "/home".to_string()
}

impl EntraConfig {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            graph_endpoint: default_graph_endpoint(),
            login_endpoint: default_login_endpoint(),
            api_version: default_api_version(),
            user_filter: None,
            group_names: Vec::new(),
            page_delay_ms: default_page_delay_ms(),
            max_retries: default_max_retries(),
            default_login_shell: default_login_shell(),
            default_home_base: default_home_base(),
            connection: ConnectionSettings::default(),
        }
    }

    /// Point both Graph and the login endpoint at one base URL.
    #[must_use]
    pub fn with_endpoints(mut self, base: &str) -> Self {
        self.graph_endpoint = base.trim_end_matches('/').to_string();
        self.login_endpoint = base.trim_end_matches('/').to_string();
        self
    }

    /// Base URL for Graph requests.
    pub fn graph_base_url(&self) -> String {
        format!(
            "{}/{}",
            self.graph_endpoint.trim_end_matches('/'),
            self.api_version
        )
    }

    /// `$filter` for the configured group names, if any.
    pub fn group_filter(&self) -> Option<String> {
        if self.group_names.is_empty() {
            return None;
        }
        let clauses: Vec<String> = self
            .group_names
            .iter()
            .map(|name| format!("displayName eq '{}'", name.replace('\'', "''")))
            .collect();
        Some(clauses.join(" or "))
    }
}

impl CollaboratorConfig for EntraConfig {
    fn validate(&self) -> ConnectorResult<()> {
        for (field, value) in [
            ("tenant_id", &self.tenant_id),
            ("client_id", &self.client_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConnectorError::invalid_configuration(format!(
                    "source.{field} is required"
                )));
            }
        }
        if url::Url::parse(&self.graph_endpoint).is_err() {
            return Err(ConnectorError::invalid_configuration(format!(
                "source.graph_endpoint is not a URL: {}",
                self.graph_endpoint
            )));
        }
        if url::Url::parse(&self.login_endpoint).is_err() {
            return Err(ConnectorError::invalid_configuration(format!(
                "source.login_endpoint is not a URL: {}",
                self.login_endpoint
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for EntraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntraConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***REDACTED***")
            .field("graph_endpoint", &self.graph_endpoint)
            .field("login_endpoint", &self.login_endpoint)
            .field("api_version", &self.api_version)
            .field("user_filter", &self.user_filter)
            .field("group_names", &self.group_names)
            .field("page_delay_ms", &self.page_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("connection", &self.connection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = EntraConfig::new("tenant", "client", "secret");
        assert_eq!(c.graph_base_url(), "https://graph.microsoft.com/v1.0");
        assert_eq!(c.page_delay_ms, 100);
        assert!(c.group_filter().is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_group_filter() {
        let mut c = EntraConfig::new("tenant", "client", "secret");
        c.group_names = vec!["Engineering".into(), "O'Neil Fans".into()];
        assert_eq!(
            c.group_filter().as_deref(),
            Some("displayName eq 'Engineering' or displayName eq 'O''Neil Fans'")
        );
    }

    #[test]
    fn test_validate_requires_tenant() {
        let c = EntraConfig::new("", "client", "secret");
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("source.tenant_id is required"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let c = EntraConfig::new("tenant", "client", "topsecret");
        assert!(!format!("{c:?}").contains("topsecret"));
    }
}
