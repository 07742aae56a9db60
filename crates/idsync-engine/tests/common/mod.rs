//! In-memory collaborators for orchestrator tests.

#![allow(dead_code)]

use async_trait::async_trait;
use idsync_connector::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

/// Source backed by fixed lists.
#[derive(Default)]
pub struct FakeSource {
    pub principals: Vec<SourcePrincipal>,
    pub groups: Vec<SourceGroup>,
    pub references: HashMap<String, ResolvedReference>,
    pub fail_connect: bool,
    pub resolve_calls: Mutex<usize>,
}

impl FakeSource {
    pub fn with_user(mut self, principal: SourcePrincipal) -> Self {
        self.references.insert(
            format!("CN={},DC=example,DC=com", principal.login),
            ResolvedReference::user(principal.login.clone()),
        );
        self.principals.push(principal);
        self
    }

    pub fn with_group(mut self, group: SourceGroup) -> Self {
        self.references.insert(
            format!("CN={},DC=example,DC=com", group.name),
            ResolvedReference::group(group.name.clone()),
        );
        self.groups.push(group);
        self
    }
}

pub fn member_dn(name: &str) -> MemberReference {
    MemberReference::new(format!("CN={name},DC=example,DC=com"))
}

#[async_trait]
impl Collaborator for FakeSource {
    fn display_name(&self) -> &str {
        "fake-source"
    }

    async fn connect(&self) -> ConnectorResult<()> {
        if self.fail_connect {
            return Err(ConnectorError::connection_failed("source unreachable"));
        }
        Ok(())
    }

    async fn test_connection(&self) -> ConnectorResult<()> {
        self.connect().await
    }
}

#[async_trait]
impl SourceDirectory for FakeSource {
    fn principal_query(&self) -> SearchQuery {
        SearchQuery::new("dc=example,dc=com", "(objectClass=user)")
    }

    fn group_query(&self) -> SearchQuery {
        SearchQuery::new("dc=example,dc=com", "(objectClass=group)")
    }

    async fn list_principals(&self, _query: &SearchQuery) -> ConnectorResult<Vec<SourcePrincipal>> {
        Ok(self.principals.clone())
    }

    async fn list_groups(&self, _query: &SearchQuery) -> ConnectorResult<Vec<SourceGroup>> {
        Ok(self.groups.clone())
    }

    async fn resolve_reference(
        &self,
        reference: &MemberReference,
    ) -> ConnectorResult<Lookup<ResolvedReference>> {
        *self.resolve_calls.lock().unwrap() += 1;
        Ok(self.references.get(reference.as_str()).cloned().into())
    }

    async fn lookup_principal(&self, login: &str) -> ConnectorResult<Lookup<SourcePrincipal>> {
        Ok(self.principals.iter().find(|p| p.login == login).cloned().into())
    }
}

/// Target that keeps state in memory and records every mutating call.
#[derive(Default)]
pub struct FakeTarget {
    pub principals: Mutex<BTreeMap<String, TargetPrincipal>>,
    pub groups: Mutex<BTreeMap<String, TargetGroup>>,
    pub calls: Mutex<Vec<String>>,
    /// Keys whose mutations fail.
    pub failing: HashSet<String>,
    pub fail_connect: bool,
    pub fail_identity_range: bool,
    /// Store member keys lower-cased and report re-adds as conflicts, the
    /// way FreeIPA does.
    pub fold_case: bool,
    /// Report a connection loss from every mutation.
    pub drop_session: bool,
    pub identity_range: Mutex<bool>,
    pub range_checks: Mutex<usize>,
    pub disconnects: Mutex<usize>,
}

impl FakeTarget {
    pub fn with_principal(self, login: &str, disabled: bool) -> Self {
        self.principals.lock().unwrap().insert(
            login.to_string(),
            TargetPrincipal {
                login: login.to_string(),
                disabled,
                attributes: AttributeSet::new(),
            },
        );
        self
    }

    pub fn with_group(self, name: &str, users: &[&str]) -> Self {
        self.groups.lock().unwrap().insert(
            name.to_string(),
            TargetGroup {
                name: name.to_string(),
                description: None,
                member_users: users.iter().map(|u| u.to_string()).collect(),
                member_groups: Default::default(),
            },
        );
        self
    }

    pub fn with_members(self, name: &str, users: &[&str], groups: &[&str]) -> Self {
        self.groups.lock().unwrap().insert(
            name.to_string(),
            TargetGroup {
                name: name.to_string(),
                description: None,
                member_users: users.iter().map(|u| u.to_string()).collect(),
                member_groups: groups.iter().map(|g| g.to_string()).collect(),
            },
        );
        self
    }

    pub fn disconnects(&self) -> usize {
        *self.disconnects.lock().unwrap()
    }

    pub fn range_checks(&self) -> usize {
        *self.range_checks.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that change state, excluding the identity range setup.
    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("ensure_identity_range"))
            .collect()
    }

    pub fn group(&self, name: &str) -> Option<TargetGroup> {
        self.groups.lock().unwrap().get(name).cloned()
    }

    pub fn principal(&self, login: &str) -> Option<TargetPrincipal> {
        self.principals.lock().unwrap().get(login).cloned()
    }

    fn record(&self, call: String, key: &str) -> ConnectorResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.drop_session {
            return Err(ConnectorError::not_connected("fake-target"));
        }
        if self.failing.contains(key) {
            return Err(ConnectorError::operation_failed(format!("injected failure for {key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl Collaborator for FakeTarget {
    fn display_name(&self) -> &str {
        "fake-target"
    }

    async fn connect(&self) -> ConnectorResult<()> {
        if self.fail_connect {
            return Err(ConnectorError::AuthenticationFailed);
        }
        Ok(())
    }

    async fn test_connection(&self) -> ConnectorResult<()> {
        self.connect().await
    }

    async fn disconnect(&self) -> ConnectorResult<()> {
        *self.disconnects.lock().unwrap() += 1;
        Ok(())
    }
}

#[async_trait]
impl TargetDirectory for FakeTarget {
    async fn find_principal(&self, key: &str) -> ConnectorResult<Lookup<TargetPrincipal>> {
        Ok(self.principal(key).into())
    }

    async fn create_principal(&self, principal: &NewPrincipal) -> ConnectorResult<()> {
        self.record(format!("create_principal {}", principal.login), &principal.login)?;
        let mut principals = self.principals.lock().unwrap();
        if principals.contains_key(&principal.login) {
            return Err(ConnectorError::already_exists(principal.login.clone()));
        }
        principals.insert(
            principal.login.clone(),
            TargetPrincipal {
                login: principal.login.clone(),
                disabled: false,
                attributes: principal.attributes.clone(),
            },
        );
        Ok(())
    }

    async fn update_principal_attributes(
        &self,
        key: &str,
        attributes: &AttributeSet,
    ) -> ConnectorResult<()> {
        self.record(format!("update_principal_attributes {key}"), key)?;
        if let Some(p) = self.principals.lock().unwrap().get_mut(key) {
            for (name, value) in attributes.iter() {
                p.attributes.set(name.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn set_principal_enabled(&self, key: &str, enabled: bool) -> ConnectorResult<()> {
        self.record(format!("set_principal_enabled {key} {enabled}"), key)?;
        if let Some(p) = self.principals.lock().unwrap().get_mut(key) {
            p.disabled = !enabled;
        }
        Ok(())
    }

    async fn find_group(&self, key: &str) -> ConnectorResult<Lookup<TargetGroup>> {
        Ok(self.group(key).into())
    }

    async fn create_group(&self, key: &str, attributes: &AttributeSet) -> ConnectorResult<()> {
        self.record(format!("create_group {key}"), key)?;
        self.groups.lock().unwrap().insert(
            key.to_string(),
            TargetGroup {
                name: key.to_string(),
                description: attributes.first_text("description"),
                ..Default::default()
            },
        );
        Ok(())
    }

    async fn update_group_attributes(
        &self,
        key: &str,
        attributes: &AttributeSet,
    ) -> ConnectorResult<()> {
        self.record(format!("update_group_attributes {key}"), key)?;
        if let Some(g) = self.groups.lock().unwrap().get_mut(key) {
            g.description = attributes.first_text("description");
        }
        Ok(())
    }

    async fn add_group_member(
        &self,
        group_key: &str,
        member_key: &str,
        kind: MemberKind,
    ) -> ConnectorResult<()> {
        self.record(format!("add_group_member {group_key} {kind} {member_key}"), member_key)?;
        let mut groups = self.groups.lock().unwrap();
        let group = groups
            .get_mut(group_key)
            .ok_or_else(|| ConnectorError::ObjectNotFound {
                identifier: group_key.to_string(),
            })?;
        let stored = if self.fold_case {
            member_key.to_lowercase()
        } else {
            member_key.to_string()
        };
        let inserted = match kind {
            MemberKind::User => group.member_users.insert(stored),
            MemberKind::Group => group.member_groups.insert(stored),
        };
        if !inserted && self.fold_case {
            return Err(ConnectorError::already_exists(member_key.to_string()));
        }
        Ok(())
    }

    async fn identity_range_exists(&self) -> ConnectorResult<bool> {
        *self.range_checks.lock().unwrap() += 1;
        Ok(*self.identity_range.lock().unwrap())
    }

    async fn ensure_identity_range(&self, base: u32, size: u32) -> ConnectorResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("ensure_identity_range {base} {size}"));
        if self.fail_identity_range {
            return Err(ConnectorError::AuthorizationFailed {
                operation: "idrange_add".to_string(),
            });
        }
        *self.identity_range.lock().unwrap() = true;
        Ok(())
    }
}

/// A disabled AD user with a domain SID.
pub fn principal(login: &str, rid: u32, disabled: bool) -> SourcePrincipal {
    let mut p = SourcePrincipal::new(login);
    p.given_name = Some("Test".into());
    p.surname = Some(login.to_uppercase());
    p.sid = SecurityIdentifier::parse(&format!("S-1-5-21-1-2-3-{rid}"));
    p.primary_group_id = Some(513);
    p.disabled = disabled;
    p
}

pub fn group(name: &str, members: &[&str]) -> SourceGroup {
    let mut g = SourceGroup::new(name);
    g.description = Some(format!("{name} group"));
    g.members = members.iter().map(|m| member_dn(m)).collect();
    g
}
