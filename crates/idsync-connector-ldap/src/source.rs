//! Active Directory source over LDAP.

use async_trait::async_trait;
use idsync_connector::config::CollaboratorConfig;
use idsync_connector::error::{ConnectorError, ConnectorResult};
use idsync_connector::model::{
    Lookup, MemberReference, ResolvedReference, SearchQuery, SourceGroup, SourcePrincipal,
};
use idsync_connector::traits::{Collaborator, SourceDirectory};
use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::config::AdConfig;
use crate::entry::{
    entry_name, entry_to_group, entry_to_principal, is_group_entry, GROUP_ATTRIBUTES,
    USER_ATTRIBUTES,
};

/// LDAP result code for invalid credentials.
const LDAP_INVALID_CREDENTIALS: u32 = 49;

/// Escape special characters in an LDAP filter value (RFC 4515).
pub fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}

/// Reads users, groups and member references from Active Directory.
pub struct AdSource {
    config: AdConfig,
    display_name: String,
    connection: Arc<RwLock<Option<Ldap>>>,
}

impl AdSource {
    pub fn new(config: AdConfig) -> ConnectorResult<Self> {
        config.validate()?;
        let display_name = format!("Active Directory: {}", config.host);
        Ok(Self {
            config,
            display_name,
            connection: Arc::new(RwLock::new(None)),
        })
    }

    pub fn config(&self) -> &AdConfig {
        &self.config
    }

    async fn get_connection(&self) -> ConnectorResult<Ldap> {
        let guard = self.connection.read().await;
        guard
            .as_ref()
            .cloned()
            .ok_or_else(|| ConnectorError::not_connected(self.display_name.clone()))
    }

    async fn create_connection(&self) -> ConnectorResult<Ldap> {
        let url = self.config.url();
        debug!(url = %url, "Connecting to domain controller");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(
                self.config.connection.connection_timeout_secs,
            ))
            .set_starttls(self.config.use_starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                ConnectorError::connection_failed_with_source(
                    format!("Failed to connect to LDAP server at {url}"),
                    e,
                )
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        debug!(bind_dn = %self.config.bind_dn, "Performing LDAP bind");
        let result = ldap
            .simple_bind(&self.config.bind_dn, self.config.bind_password.expose_secret())
            .await
            .map_err(|e| {
                ConnectorError::connection_failed_with_source(
                    format!("LDAP bind failed for {}", self.config.bind_dn),
                    e,
                )
            })?;

        if result.rc != 0 {
            if result.rc == LDAP_INVALID_CREDENTIALS {
                return Err(ConnectorError::AuthenticationFailed);
            }
            return Err(ConnectorError::connection_failed(format!(
                "LDAP bind failed with code {}: {}",
                result.rc, result.text
            )));
        }

        info!(host = %self.config.host, "Connected to Active Directory");
        Ok(ldap)
    }

    /// Run a subtree search with the paged-results control.
    async fn paged_search(
        &self,
        base: &str,
        filter: &str,
        attributes: &[String],
    ) -> ConnectorResult<Vec<SearchEntry>> {
        let mut ldap = self.get_connection().await?;
        let page_size = i32::try_from(self.config.page_size).unwrap_or(i32::MAX);
        let adapters: Vec<Box<dyn Adapter<_, _>>> = vec![
            Box::new(EntriesOnly::new()),
            Box::new(PagedResults::new(page_size)),
        ];
        let attrs: Vec<&str> = attributes.iter().map(String::as_str).collect();

        debug!(base = %base, filter = %filter, page_size, "Searching LDAP");
        let mut search = ldap
            .streaming_search_with(adapters, base, Scope::Subtree, filter, attrs)
            .await
            .map_err(|e| ConnectorError::operation_failed_with_source("LDAP search failed", e))?;

        let mut entries = Vec::new();
        while let Some(entry) = search
            .next()
            .await
            .map_err(|e| ConnectorError::operation_failed_with_source("LDAP search failed", e))?
        {
            entries.push(SearchEntry::construct(entry));
        }
        search.finish().await.success().map_err(|e| {
            ConnectorError::operation_failed_with_source(format!("LDAP search under {base} failed"), e)
        })?;

        debug!(count = entries.len(), "LDAP search completed");
        Ok(entries)
    }

    async fn search_one(
        &self,
        filter: &str,
        attributes: &[&str],
    ) -> ConnectorResult<Option<SearchEntry>> {
        let mut ldap = self.get_connection().await?;
        let result = ldap
            .search(&self.config.base_dn, Scope::Subtree, filter, attributes.to_vec())
            .await
            .map_err(|e| ConnectorError::operation_failed_with_source("LDAP search failed", e))?;
        let (entries, _) = result
            .success()
            .map_err(|e| ConnectorError::operation_failed_with_source("LDAP search failed", e))?;
        Ok(entries.into_iter().next().map(SearchEntry::construct))
    }
}

#[async_trait]
impl Collaborator for AdSource {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    #[instrument(skip(self), fields(host = %self.config.host))]
    async fn connect(&self) -> ConnectorResult<()> {
        let ldap = self.create_connection().await?;
        *self.connection.write().await = Some(ldap);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn test_connection(&self) -> ConnectorResult<()> {
        if self.connection.read().await.is_none() {
            self.connect().await?;
        }
        let mut ldap = self.get_connection().await?;
        let result = ldap
            .search(&self.config.base_dn, Scope::Base, "(objectClass=*)", vec!["dn"])
            .await
            .map_err(|e| ConnectorError::connection_failed_with_source("Test search failed", e))?;
        let (entries, _) = result
            .success()
            .map_err(|e| ConnectorError::connection_failed_with_source("Test search failed", e))?;
        if entries.is_empty() {
            return Err(ConnectorError::connection_failed(format!(
                "Base DN '{}' not found or not accessible",
                self.config.base_dn
            )));
        }
        info!("Active Directory connection test successful");
        Ok(())
    }

    async fn disconnect(&self) -> ConnectorResult<()> {
        if let Some(mut ldap) = self.connection.write().await.take() {
            if let Err(e) = ldap.unbind().await {
                warn!(error = %e, "Error during LDAP unbind");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SourceDirectory for AdSource {
    fn principal_query(&self) -> SearchQuery {
        SearchQuery::new(self.config.user_search_base(), self.config.user_filter.clone())
            .with_attributes(USER_ATTRIBUTES)
    }

    fn group_query(&self) -> SearchQuery {
        SearchQuery::new(self.config.group_search_base(), self.config.group_filter.clone())
            .with_attributes(GROUP_ATTRIBUTES)
    }

    #[instrument(skip(self, query), fields(base = %query.search_base))]
    async fn list_principals(&self, query: &SearchQuery) -> ConnectorResult<Vec<SourcePrincipal>> {
        let entries = self
            .paged_search(&query.search_base, &query.filter, &query.attributes)
            .await?;
        let principals: Vec<_> = entries.iter().filter_map(entry_to_principal).collect();
        info!(
            entries = entries.len(),
            principals = principals.len(),
            "Retrieved users from Active Directory"
        );
        Ok(principals)
    }

    #[instrument(skip(self, query), fields(base = %query.search_base))]
    async fn list_groups(&self, query: &SearchQuery) -> ConnectorResult<Vec<SourceGroup>> {
        let entries = self
            .paged_search(&query.search_base, &query.filter, &query.attributes)
            .await?;
        let groups: Vec<_> = entries.iter().filter_map(entry_to_group).collect();
        info!(count = groups.len(), "Retrieved groups from Active Directory");
        Ok(groups)
    }

    async fn resolve_reference(
        &self,
        reference: &MemberReference,
    ) -> ConnectorResult<Lookup<ResolvedReference>> {
        let filter = format!(
            "(distinguishedName={})",
            escape_filter_value(reference.as_str())
        );
        let Some(entry) = self
            .search_one(&filter, &["sAMAccountName", "objectClass"])
            .await?
        else {
            return Ok(Lookup::NotFound);
        };
        let Some(name) = entry_name(&entry) else {
            return Ok(Lookup::NotFound);
        };
        let resolved = if is_group_entry(&entry) {
            ResolvedReference::group(name)
        } else {
            ResolvedReference::user(name)
        };
        Ok(Lookup::Found(resolved))
    }

    async fn lookup_principal(&self, login: &str) -> ConnectorResult<Lookup<SourcePrincipal>> {
        let filter = format!(
            "(&(objectClass=user)(sAMAccountName={}))",
            escape_filter_value(login)
        );
        let entry = self.search_one(&filter, USER_ATTRIBUTES).await?;
        Ok(entry.as_ref().and_then(entry_to_principal).into())
    }
}

impl std::fmt::Debug for AdSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdSource")
            .field("display_name", &self.display_name)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_filter_value() {
        assert_eq!(escape_filter_value("plain"), "plain");
        assert_eq!(escape_filter_value("a*b"), "a\\2ab");
        assert_eq!(
            escape_filter_value("CN=Doe\\, John (IT),DC=example"),
            "CN=Doe\\5c, John \\28IT\\29,DC=example"
        );
        assert_eq!(escape_filter_value("nul\0"), "nul\\00");
    }

    #[test]
    fn test_queries_use_config() {
        let mut config = crate::config::AdConfig::new(
            "dc1.example.com",
            "DC=example,DC=com",
            "svc",
            "pw",
        );
        config.group_search_base = Some("OU=Groups,DC=example,DC=com".into());
        let source = AdSource::new(config).unwrap();

        let users = source.principal_query();
        assert_eq!(users.search_base, "DC=example,DC=com");
        assert!(users.attributes.iter().any(|a| a == "objectSid"));

        let groups = source.group_query();
        assert_eq!(groups.search_base, "OU=Groups,DC=example,DC=com");
        assert!(groups.attributes.iter().any(|a| a == "member"));
    }

    #[tokio::test]
    async fn test_listing_before_connect_is_not_connected() {
        let config = crate::config::AdConfig::new("dc1.example.com", "DC=example,DC=com", "svc", "pw");
        let source = AdSource::new(config).unwrap();
        let err = source
            .list_principals(&source.principal_query())
            .await
            .unwrap_err();
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_debug_redacts() {
        let config = crate::config::AdConfig::new("dc1", "DC=x", "svc", "hunter2");
        let source = AdSource::new(config).unwrap();
        assert!(!format!("{source:?}").contains("hunter2"));
    }
}
