//! Active Directory source configuration.

use idsync_connector::config::{CollaboratorConfig, ConnectionSettings};
use idsync_connector::error::{ConnectorError, ConnectorResult};
use secrecy::SecretString;
use serde::Deserialize;

/// Connection and search settings for an Active Directory source.
#[derive(Clone, Deserialize)]
pub struct AdConfig {
    /// Domain controller hostname or IP address.
    pub host: String,

    /// Port (389 for LDAP, 636 for LDAPS).
    #[serde(default = "default_ldap_port")]
    pub port: u16,

    /// Use LDAPS.
    #[serde(default)]
    pub use_ssl: bool,

    /// Use STARTTLS upgrade on a plain LDAP connection.
    #[serde(default)]
    pub use_starttls: bool,

    /// Domain naming context (e.g. "DC=example,DC=com").
    pub base_dn: String,

    /// Bind DN or UPN for authentication.
    pub bind_dn: String,

    pub bind_password: SecretString,

    /// Where to search for users. Defaults to `base_dn`.
    #[serde(default)]
    pub user_search_base: Option<String>,

    #[serde(default = "default_user_filter")]
    pub user_filter: String,

    /// Where to search for groups. Defaults to `base_dn`.
    #[serde(default)]
    pub group_search_base: Option<String>,

    #[serde(default = "default_group_filter")]
    pub group_filter: String,

    /// Page size for the paged-results control.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default)]
    pub connection: ConnectionSettings,
}

fn default_ldap_port() -> u16 {
    389
}

fn default_user_filter() -> String {
    "(&(objectClass=user)(objectCategory=person))".to_string()
}

fn default_group_filter() -> String {
    "(objectClass=group)".to_string()
}

fn default_page_size() -> u32 {
    500
}

impl AdConfig {
    /// Create a configuration with defaults for everything optional.
    pub fn new(
        host: impl Into<String>,
        base_dn: impl Into<String>,
        bind_dn: impl Into<String>,
        bind_password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: default_ldap_port(),
            use_ssl: false,
            use_starttls: false,
            base_dn: base_dn.into(),
            bind_dn: bind_dn.into(),
            bind_password: SecretString::new(bind_password.into()),
            user_search_base: None,
            user_filter: default_user_filter(),
            group_search_base: None,
            group_filter: default_group_filter(),
            page_size: default_page_size(),
            connection: ConnectionSettings::default(),
        }
    }

    /// Server URL.
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    pub fn user_search_base(&self) -> &str {
        self.user_search_base.as_deref().unwrap_or(&self.base_dn)
    }

    pub fn group_search_base(&self) -> &str {
        self.group_search_base.as_deref().unwrap_or(&self.base_dn)
    }
}

impl CollaboratorConfig for AdConfig {
    fn validate(&self) -> ConnectorResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConnectorError::invalid_configuration("source.host is required"));
        }
        if self.base_dn.trim().is_empty() {
            return Err(ConnectorError::invalid_configuration("source.base_dn is required"));
        }
        if self.bind_dn.trim().is_empty() {
            return Err(ConnectorError::invalid_configuration("source.bind_dn is required"));
        }
        if self.use_ssl && self.use_starttls {
            return Err(ConnectorError::invalid_configuration(
                "source: cannot use both SSL and STARTTLS",
            ));
        }
        if self.page_size == 0 {
            return Err(ConnectorError::invalid_configuration(
                "source.page_size must be positive",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AdConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &"***REDACTED***")
            .field("user_search_base", &self.user_search_base)
            .field("user_filter", &self.user_filter)
            .field("group_search_base", &self.group_search_base)
            .field("group_filter", &self.group_filter)
            .field("page_size", &self.page_size)
            .field("connection", &self.connection)
            .finish()
    }
}
