//! FreeIPA as the sync target.

use async_trait::async_trait;
use idsync_connector::config::CollaboratorConfig;
use idsync_connector::error::{ConnectorError, ConnectorResult};
use idsync_connector::model::{Lookup, MemberKind, NewPrincipal, TargetGroup, TargetPrincipal};
use idsync_connector::operation::AttributeSet;
use idsync_connector::traits::{Collaborator, TargetDirectory};
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::client::FreeIpaClient;
use crate::config::FreeIpaConfig;
use crate::entry::{entry_to_group, entry_to_principal};
use crate::error::{FreeIpaError, FreeIpaResult};

/// Reason FreeIPA gives when a member is already present.
const ALREADY_MEMBER: &str = "already a member";

/// RID base for a new identity range starting at `base`.
pub fn rid_base_for(base: u32) -> u32 {
    (base % 1_000_000_000) / 1000
}

/// Secondary RID base paired with [`rid_base_for`].
pub fn secondary_rid_base_for(base: u32) -> u32 {
    100_000_000 + rid_base_for(base)
}

fn options(attributes: &AttributeSet) -> Map<String, Value> {
    attributes
        .iter()
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect()
}

fn show_entry(result: &Value, method: &str) -> FreeIpaResult<Map<String, Value>> {
    result
        .get("result")
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| FreeIpaError::UnexpectedResponse {
            method: method.to_string(),
            message: "missing result entry".to_string(),
        })
}

/// Per-member failures reported in a `group_add_member` answer.
#[derive(Debug, Default, PartialEq, Eq)]
struct MemberFailures {
    /// Members that were already present.
    already_present: Vec<String>,
    /// Everything else, as `name: reason`.
    rejected: Vec<String>,
}

fn member_failures(result: &Value, kind: MemberKind) -> MemberFailures {
    let field = match kind {
        MemberKind::User => "user",
        MemberKind::Group => "group",
    };
    let mut failures = MemberFailures::default();
    let entries = result
        .pointer(&format!("/failed/member/{field}"))
        .and_then(Value::as_array);
    for failure in entries.into_iter().flatten() {
        let Some(pair) = failure.as_array() else {
            continue;
        };
        let name = pair.first().and_then(Value::as_str).unwrap_or_default();
        let reason = pair.get(1).and_then(Value::as_str).unwrap_or_default();
        if reason.contains(ALREADY_MEMBER) {
            debug!(member = %name, "Already a member");
            failures.already_present.push(name.to_string());
        } else {
            failures.rejected.push(format!("{name}: {reason}"));
        }
    }
    failures
}

/// Writes users, groups and memberships to FreeIPA over JSON-RPC.
pub struct FreeIpaTarget {
    config: FreeIpaConfig,
    display_name: String,
    client: FreeIpaClient,
}

impl FreeIpaTarget {
    pub fn new(config: FreeIpaConfig) -> ConnectorResult<Self> {
        config.validate()?;
        let client = FreeIpaClient::new(&config)?;
        Ok(Self {
            display_name: format!("FreeIPA: {}", config.server),
            config,
            client,
        })
    }

    pub fn config(&self) -> &FreeIpaConfig {
        &self.config
    }

    async fn ensure_connected(&self) -> ConnectorResult<()> {
        if self.client.is_logged_in().await {
            Ok(())
        } else {
            Err(ConnectorError::not_connected(self.display_name.clone()))
        }
    }

    /// Run a call whose "already in place" answers count as success.
    async fn idempotent_call(
        &self,
        method: &str,
        args: Vec<Value>,
        options: Map<String, Value>,
    ) -> ConnectorResult<()> {
        self.ensure_connected().await?;
        match self.client.call(method, args, options).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_no_op() => {
                debug!(method, reason = %e, "Nothing to change");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn show(
        &self,
        method: &str,
        key: &str,
    ) -> ConnectorResult<Option<Map<String, Value>>> {
        self.ensure_connected().await?;
        let mut opts = Map::new();
        opts.insert("all".to_string(), json!(true));
        match self.client.call(method, vec![json!(key)], opts).await {
            Ok(result) => Ok(Some(show_entry(&result, method)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Collaborator for FreeIpaTarget {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    #[instrument(skip(self), fields(server = %self.config.server))]
    async fn connect(&self) -> ConnectorResult<()> {
        self.client.login().await?;
        info!(user = %self.config.username, "Logged in to FreeIPA");
        Ok(())
    }

    async fn test_connection(&self) -> ConnectorResult<()> {
        if !self.client.is_logged_in().await {
            self.connect().await?;
        }
        self.client.call("ping", vec![], Map::new()).await?;
        Ok(())
    }

    async fn disconnect(&self) -> ConnectorResult<()> {
        if let Err(e) = self.client.logout().await {
            debug!(error = %e, "FreeIPA logout failed");
        }
        Ok(())
    }
}

#[async_trait]
impl TargetDirectory for FreeIpaTarget {
    async fn find_principal(&self, key: &str) -> ConnectorResult<Lookup<TargetPrincipal>> {
        Ok(self
            .show("user_show", key)
            .await?
            .map(|entry| entry_to_principal(key, &entry))
            .into())
    }

    #[instrument(skip(self, principal), fields(login = %principal.login))]
    async fn create_principal(&self, principal: &NewPrincipal) -> ConnectorResult<()> {
        self.ensure_connected().await?;
        let mut opts = options(&principal.attributes);
        opts.insert("givenname".to_string(), json!(principal.given_name));
        opts.insert("sn".to_string(), json!(principal.surname));
        opts.insert("cn".to_string(), json!(principal.common_name));

        self.client
            .call("user_add", vec![json!(principal.login)], opts)
            .await
            .map_err(|e| match e {
                e if e.is_duplicate() => ConnectorError::already_exists(principal.login.clone()),
                e => e.into(),
            })?;
        Ok(())
    }

    async fn update_principal_attributes(
        &self,
        key: &str,
        attributes: &AttributeSet,
    ) -> ConnectorResult<()> {
        self.idempotent_call("user_mod", vec![json!(key)], options(attributes))
            .await
    }

    async fn set_principal_enabled(&self, key: &str, enabled: bool) -> ConnectorResult<()> {
        let method = if enabled { "user_enable" } else { "user_disable" };
        self.idempotent_call(method, vec![json!(key)], Map::new())
            .await
    }

    async fn find_group(&self, key: &str) -> ConnectorResult<Lookup<TargetGroup>> {
        Ok(self
            .show("group_show", key)
            .await?
            .map(|entry| entry_to_group(key, &entry))
            .into())
    }

    async fn create_group(&self, key: &str, attributes: &AttributeSet) -> ConnectorResult<()> {
        self.ensure_connected().await?;
        self.client
            .call("group_add", vec![json!(key)], options(attributes))
            .await
            .map_err(|e| match e {
                e if e.is_duplicate() => ConnectorError::already_exists(key),
                e => e.into(),
            })?;
        Ok(())
    }

    async fn update_group_attributes(
        &self,
        key: &str,
        attributes: &AttributeSet,
    ) -> ConnectorResult<()> {
        self.idempotent_call("group_mod", vec![json!(key)], options(attributes))
            .await
    }

    async fn add_group_member(
        &self,
        group_key: &str,
        member_key: &str,
        kind: MemberKind,
    ) -> ConnectorResult<()> {
        self.ensure_connected().await?;
        let mut opts = Map::new();
        opts.insert(kind.to_string(), json!([member_key]));

        let result = self
            .client
            .call("group_add_member", vec![json!(group_key)], opts)
            .await?;

        let failures = member_failures(&result, kind);
        if !failures.rejected.is_empty() {
            return Err(ConnectorError::operation_failed(format!(
                "could not add {kind} to {group_key}: {}",
                failures.rejected.join("; ")
            )));
        }
        if !failures.already_present.is_empty() {
            return Err(ConnectorError::already_exists(format!(
                "{kind} {member_key} in {group_key}"
            )));
        }
        Ok(())
    }

    async fn identity_range_exists(&self) -> ConnectorResult<bool> {
        let name = self.config.id_range_name.as_str();
        Ok(self.show("idrange_show", name).await?.is_some())
    }

    #[instrument(skip(self), fields(range = %self.config.id_range_name))]
    async fn ensure_identity_range(&self, base: u32, size: u32) -> ConnectorResult<()> {
        let name = self.config.id_range_name.as_str();
        if self.identity_range_exists().await? {
            info!("ID range '{}' already exists", name);
            return Ok(());
        }

        let rid_base = rid_base_for(base);
        info!(base, size, rid_base, "Creating ID range '{}'", name);
        let mut opts = Map::new();
        opts.insert("ipabaseid".to_string(), json!(base));
        opts.insert("ipaidrangesize".to_string(), json!(size));
        opts.insert("ipabaserid".to_string(), json!(rid_base));
        opts.insert(
            "ipasecondarybaserid".to_string(),
            json!(secondary_rid_base_for(base)),
        );

        match self.client.call("idrange_add", vec![json!(name)], opts).await {
            Ok(_) => {
                warn!(
                    "Created ID range '{}'; restart the directory server \
                     (systemctl restart dirsrv@*.service) before relying on it",
                    name
                );
                Ok(())
            }
            Err(e) if e.is_duplicate() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for FreeIpaTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreeIpaTarget")
            .field("display_name", &self.display_name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
