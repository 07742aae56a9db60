//! Entra ID source over Microsoft Graph.

use async_trait::async_trait;
use idsync_connector::config::CollaboratorConfig;
use idsync_connector::error::{ConnectorError, ConnectorResult};
use idsync_connector::model::{
    Lookup, MemberReference, ResolvedReference, SearchQuery, SourceGroup, SourcePrincipal,
};
use idsync_connector::traits::{Collaborator, SourceDirectory};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::auth::TokenCache;
use crate::config::EntraConfig;
use crate::error::{EntraError, EntraResult};
use crate::graph_client::GraphClient;
use crate::model::{
    login_from_upn, DirectoryObject, GraphGroup, GraphUser, UserDefaults, GROUP_SELECT,
    MEMBER_SELECT, USER_SELECT,
};

/// Reads users, groups and memberships from an Entra ID tenant.
///
/// Member listings already carry each member's type, so classifications seen
/// while listing groups are kept and answer later `resolve_reference` calls
/// without another round trip.
pub struct EntraSource {
    config: EntraConfig,
    display_name: String,
    token_cache: Arc<TokenCache>,
    client: GraphClient,
    defaults: UserDefaults,
    classified: RwLock<HashMap<String, ResolvedReference>>,
}

impl EntraSource {
    pub fn new(config: EntraConfig) -> ConnectorResult<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.connection.request_timeout_secs))
            .connect_timeout(Duration::from_secs(
                config.connection.connection_timeout_secs,
            ))
            .build()
            .map_err(|e| {
                ConnectorError::invalid_configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        let token_cache = Arc::new(TokenCache::new(&config, http_client.clone()));
        let client = GraphClient::new(http_client, Arc::clone(&token_cache), config.graph_base_url())
            .with_max_retries(config.max_retries)
            .with_page_delay(Duration::from_millis(config.page_delay_ms));

        Ok(Self {
            display_name: format!("Entra ID: {}", config.tenant_id),
            defaults: UserDefaults {
                login_shell: config.default_login_shell.clone(),
                home_base: config.default_home_base.clone(),
            },
            config,
            token_cache,
            client,
            classified: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &EntraConfig {
        &self.config
    }

    fn query_url(&self, query: &SearchQuery, select: &str) -> EntraResult<String> {
        let mut params = vec![("$select", select)];
        if !query.filter.trim().is_empty() {
            params.push(("$filter", query.filter.as_str()));
        }
        self.client.url(&query.search_base, &params)
    }

    async fn members_of(&self, group_id: &str) -> EntraResult<Vec<MemberReference>> {
        let url = self.client.url(
            &format!("groups/{group_id}/members"),
            &[("$select", MEMBER_SELECT)],
        )?;
        let objects: Vec<DirectoryObject> = self.client.get_all_pages(&url).await?;

        let mut members = Vec::with_capacity(objects.len());
        let mut classified = self.classified.write().await;
        for object in objects {
            match object.classify() {
                Some(resolved) => {
                    classified.insert(object.id.clone(), resolved);
                    members.push(MemberReference::new(object.id));
                }
                None => debug!(
                    group_id = %group_id,
                    member_id = %object.id,
                    odata_type = ?object.odata_type,
                    "Skipping member that is neither a user nor a group"
                ),
            }
        }
        Ok(members)
    }
}

#[async_trait]
impl Collaborator for EntraSource {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    #[instrument(skip(self), fields(tenant_id = %self.config.tenant_id))]
    async fn connect(&self) -> ConnectorResult<()> {
        self.token_cache.get_token().await?;
        info!("Acquired Microsoft Graph token");
        Ok(())
    }

    async fn test_connection(&self) -> ConnectorResult<()> {
        self.connect().await?;
        let url = self
            .client
            .url("users", &[("$top", "1"), ("$select", "id")])
            .map_err(ConnectorError::from)?;
        let _: serde_json::Value = self.client.get(&url).await?;
        Ok(())
    }

    async fn disconnect(&self) -> ConnectorResult<()> {
        self.token_cache.invalidate().await;
        Ok(())
    }
}

#[async_trait]
impl SourceDirectory for EntraSource {
    fn principal_query(&self) -> SearchQuery {
        SearchQuery::new("users", self.config.user_filter.clone().unwrap_or_default())
    }

    fn group_query(&self) -> SearchQuery {
        SearchQuery::new("groups", self.config.group_filter().unwrap_or_default())
    }

    #[instrument(skip(self, query), fields(resource = %query.search_base))]
    async fn list_principals(&self, query: &SearchQuery) -> ConnectorResult<Vec<SourcePrincipal>> {
        let url = self.query_url(query, USER_SELECT)?;
        let users: Vec<GraphUser> = self.client.get_all_pages(&url).await?;
        let total = users.len();

        let principals: Vec<SourcePrincipal> = users
            .into_iter()
            .filter_map(|u| u.into_principal(&self.defaults))
            .collect();
        info!(count = principals.len(), skipped = total - principals.len(), "Fetched users");
        Ok(principals)
    }

    #[instrument(skip(self, query), fields(resource = %query.search_base))]
    async fn list_groups(&self, query: &SearchQuery) -> ConnectorResult<Vec<SourceGroup>> {
        let url = self.query_url(query, GROUP_SELECT)?;
        let graph_groups: Vec<GraphGroup> = self.client.get_all_pages(&url).await?;

        let mut groups = Vec::with_capacity(graph_groups.len());
        for graph_group in graph_groups {
            let id = graph_group.id.clone();
            let Some(mut group) = graph_group.into_group() else {
                debug!(group_id = %id, "Skipping group without a display name");
                continue;
            };
            group.members = self.members_of(&id).await?;
            groups.push(group);
        }
        info!(count = groups.len(), "Fetched groups");
        Ok(groups)
    }

    async fn resolve_reference(
        &self,
        reference: &MemberReference,
    ) -> ConnectorResult<Lookup<ResolvedReference>> {
        if let Some(resolved) = self.classified.read().await.get(reference.as_str()) {
            return Ok(Lookup::Found(resolved.clone()));
        }

        let url = self.client.url(
            &format!("directoryObjects/{}", reference.as_str()),
            &[("$select", MEMBER_SELECT)],
        )?;
        let object: DirectoryObject = match self.client.get(&url).await {
            Ok(object) => object,
            Err(EntraError::NotFound(_)) => return Ok(Lookup::NotFound),
            Err(e) => return Err(e.into()),
        };

        let resolved = object.classify();
        if let Some(ref r) = resolved {
            self.classified
                .write()
                .await
                .insert(reference.as_str().to_string(), r.clone());
        }
        Ok(resolved.into())
    }

    async fn lookup_principal(&self, login: &str) -> ConnectorResult<Lookup<SourcePrincipal>> {
        let prefix = format!("{}@", login.replace('\'', "''"));
        let filter = format!("startswith(userPrincipalName,'{prefix}')");
        let url = self
            .client
            .url("users", &[("$filter", filter.as_str()), ("$select", USER_SELECT)])?;
        let users: Vec<GraphUser> = self.client.get_all_pages(&url).await?;

        let found = users
            .into_iter()
            .filter(|u| {
                u.user_principal_name
                    .as_deref()
                    .and_then(login_from_upn)
                    .is_some_and(|l| l.eq_ignore_ascii_case(login))
            })
            .find_map(|u| u.into_principal(&self.defaults));
        Ok(found.into())
    }
}

impl std::fmt::Debug for EntraSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntraSource")
            .field("display_name", &self.display_name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
