//! Sync policy configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{SyncError, SyncResult};
use crate::scope::ScopeFilter;

/// Source attribute name to target attribute name.
pub type AttributeMappingTable = BTreeMap<String, String>;

/// Policy for a sync run, read from the `sync:` section of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Offset added to every RID.
    #[serde(default = "default_id_range_base")]
    pub id_range_base: u32,

    /// Size of the identity range provisioned on the target.
    #[serde(default = "default_id_range_size")]
    pub id_range_size: u32,

    /// Ensure the identity range exists on the target before syncing.
    #[serde(default = "default_true")]
    pub ensure_id_range: bool,

    /// Domain used to synthesize `mail` when the source has none.
    #[serde(default)]
    pub default_email_domain: Option<String>,

    #[serde(default)]
    pub default_login_shell: Option<String>,

    /// Parent directory for synthesized home directories.
    #[serde(default)]
    pub default_home_base: Option<String>,

    #[serde(default = "default_user_mapping")]
    pub user_attribute_mapping: AttributeMappingTable,

    #[serde(default = "default_group_mapping")]
    pub group_attribute_mapping: AttributeMappingTable,

    #[serde(default)]
    pub user_include_filter: Vec<String>,
    #[serde(default)]
    pub user_exclude_filter: Vec<String>,
    #[serde(default)]
    pub group_include_filter: Vec<String>,
    #[serde(default)]
    pub group_exclude_filter: Vec<String>,

    #[serde(default = "default_true")]
    pub sync_users: bool,
    #[serde(default = "default_true")]
    pub sync_groups: bool,
    #[serde(default = "default_true")]
    pub sync_group_memberships: bool,
}

fn default_id_range_base() -> u32 {
    200_000
}

fn default_id_range_size() -> u32 {
    200_000
}

fn default_true() -> bool {
    true
}

/// Default user attribute table.
pub fn default_user_mapping() -> AttributeMappingTable {
    [
        ("sAMAccountName", "uid"),
        ("givenName", "givenname"),
        ("sn", "sn"),
        ("displayName", "cn"),
        ("mail", "mail"),
        ("telephoneNumber", "telephonenumber"),
        ("title", "title"),
        ("uidNumber", "uidnumber"),
        ("gidNumber", "gidnumber"),
        ("loginShell", "loginshell"),
        ("unixHomeDirectory", "homedirectory"),
    ]
    .into_iter()
    .map(|(s, t)| (s.to_string(), t.to_string()))
    .collect()
}

/// Default group attribute table.
pub fn default_group_mapping() -> AttributeMappingTable {
    [("description", "description"), ("gidNumber", "gidnumber")]
        .into_iter()
        .map(|(s, t)| (s.to_string(), t.to_string()))
        .collect()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            id_range_base: default_id_range_base(),
            id_range_size: default_id_range_size(),
            ensure_id_range: true,
            default_email_domain: None,
            default_login_shell: None,
            default_home_base: None,
            user_attribute_mapping: default_user_mapping(),
            group_attribute_mapping: default_group_mapping(),
            user_include_filter: Vec::new(),
            user_exclude_filter: Vec::new(),
            group_include_filter: Vec::new(),
            group_exclude_filter: Vec::new(),
            sync_users: true,
            sync_groups: true,
            sync_group_memberships: true,
        }
    }
}

impl SyncConfig {
    pub fn user_scope(&self) -> ScopeFilter {
        ScopeFilter::new(
            self.user_include_filter.clone(),
            self.user_exclude_filter.clone(),
        )
    }

    pub fn group_scope(&self) -> ScopeFilter {
        ScopeFilter::new(
            self.group_include_filter.clone(),
            self.group_exclude_filter.clone(),
        )
    }

    /// Check value ranges.
    pub fn validate(&self) -> SyncResult<()> {
        if self.id_range_size == 0 {
            return Err(SyncError::configuration("sync.id_range_size must be positive"));
        }
        if self.id_range_base.checked_add(self.id_range_size).is_none() {
            return Err(SyncError::configuration(
                "sync.id_range_base + sync.id_range_size exceeds the 32-bit id space",
            ));
        }
        if let Some(domain) = &self.default_email_domain {
            if domain.trim().is_empty() || domain.contains('@') {
                return Err(SyncError::configuration(format!(
                    "sync.default_email_domain is not a domain: '{domain}'"
                )));
            }
        }
        Ok(())
    }
}

/// Per-invocation switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Suppress every mutating call.
    pub dry_run: bool,
    /// Overwrite attributes of existing principals.
    pub force_users: bool,
    /// Overwrite attributes of existing groups.
    pub force_groups: bool,
}
