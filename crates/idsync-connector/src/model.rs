//! Source and target records exchanged with the reconciliation engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::operation::AttributeSet;
use crate::sid::SecurityIdentifier;

/// Result of an existence check.
///
/// "Not found" is an expected outcome that selects the create path, never an
/// error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The entity exists.
    Found(T),
    /// The entity does not exist.
    NotFound,
}

impl<T> Lookup<T> {
    /// Convert into an `Option`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::NotFound => None,
        }
    }

    /// Whether the entity was found.
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// Borrow the found value.
    pub fn as_ref(&self) -> Lookup<&T> {
        match self {
            Lookup::Found(v) => Lookup::Found(v),
            Lookup::NotFound => Lookup::NotFound,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Lookup::NotFound, Lookup::Found)
    }
}

/// Kind of a group member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    User,
    Group,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::User => write!(f, "user"),
            MemberKind::Group => write!(f, "group"),
        }
    }
}

/// Unclassified member reference as stored on a source group: a DN for
/// Active Directory, an object id for Entra ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberReference(String);

impl MemberReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberReference {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A member reference resolved against the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedReference {
    pub kind: MemberKind,
    /// Source-native name (login or group name).
    pub name: String,
}

impl ResolvedReference {
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            kind: MemberKind::User,
            name: name.into(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self {
            kind: MemberKind::Group,
            name: name.into(),
        }
    }
}

/// Search parameters handed to a source listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Search base (LDAP) or resource path (Graph).
    pub search_base: String,
    /// Filter expression in the source's native syntax; empty means none.
    pub filter: String,
    /// Attributes to fetch.
    pub attributes: Vec<String>,
}

impl SearchQuery {
    pub fn new(search_base: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            search_base: search_base.into(),
            filter: filter.into(),
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: &[&str]) -> Self {
        self.attributes = attributes.iter().map(|a| (*a).to_string()).collect();
        self
    }
}

/// A user principal read from the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcePrincipal {
    /// Source-native login name (`sAMAccountName`, UPN local part).
    pub login: String,
    /// Distinguished name or object id, for diagnostics.
    pub source_id: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub telephone_number: Option<String>,
    pub title: Option<String>,
    pub department: Option<String>,
    pub login_shell: Option<String>,
    pub home_directory: Option<String>,
    /// Explicit numeric identity stored in the source.
    pub uid_number: Option<u32>,
    /// Explicit group numeric identity stored in the source.
    pub gid_number: Option<u32>,
    /// RID of the primary group.
    pub primary_group_id: Option<u32>,
    pub sid: Option<SecurityIdentifier>,
    pub disabled: bool,
    /// Fields without a dedicated slot.
    #[serde(default)]
    pub extra: AttributeSet,
}

impl SourcePrincipal {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            ..Default::default()
        }
    }

    /// Look up a field by its source-native attribute name.
    ///
    /// Known names resolve to the fixed fields; anything else falls back to
    /// the residual set. Names compare case-insensitively, like LDAP.
    pub fn attribute(&self, name: &str) -> Option<String> {
        let fixed = match name.to_ascii_lowercase().as_str() {
            "samaccountname" | "uid" | "login" => Some(Some(self.login.clone())),
            "givenname" => Some(self.given_name.clone()),
            "sn" | "surname" => Some(self.surname.clone()),
            "displayname" => Some(self.display_name.clone()),
            "mail" => Some(self.mail.clone()),
            "telephonenumber" | "businessphones" => Some(self.telephone_number.clone()),
            "title" | "jobtitle" => Some(self.title.clone()),
            "department" => Some(self.department.clone()),
            "loginshell" => Some(self.login_shell.clone()),
            "unixhomedirectory" | "homedirectory" => Some(self.home_directory.clone()),
            "uidnumber" => Some(self.uid_number.map(|n| n.to_string())),
            "gidnumber" => Some(self.gid_number.map(|n| n.to_string())),
            "primarygroupid" => Some(self.primary_group_id.map(|n| n.to_string())),
            "objectsid" | "onpremisessecurityidentifier" => {
                Some(self.sid.as_ref().map(ToString::to_string))
            }
            _ => None,
        };
        match fixed {
            Some(value) => value.filter(|v| !v.trim().is_empty()),
            None => residual(&self.extra, name),
        }
    }
}

/// A group read from the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceGroup {
    /// Source-native group name.
    pub name: String,
    pub source_id: Option<String>,
    pub description: Option<String>,
    /// Explicit group numeric identity stored in the source.
    pub gid_number: Option<u32>,
    pub sid: Option<SecurityIdentifier>,
    /// Member references in source order.
    #[serde(default)]
    pub members: Vec<MemberReference>,
    #[serde(default)]
    pub extra: AttributeSet,
}

impl SourceGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Look up a field by its source-native attribute name.
    pub fn attribute(&self, name: &str) -> Option<String> {
        let fixed = match name.to_ascii_lowercase().as_str() {
            "samaccountname" | "cn" | "name" | "displayname" => Some(Some(self.name.clone())),
            "description" => Some(self.description.clone()),
            "gidnumber" => Some(self.gid_number.map(|n| n.to_string())),
            "objectsid" | "onpremisessecurityidentifier" => {
                Some(self.sid.as_ref().map(ToString::to_string))
            }
            _ => None,
        };
        match fixed {
            Some(value) => value.filter(|v| !v.trim().is_empty()),
            None => residual(&self.extra, name),
        }
    }
}

fn residual(extra: &AttributeSet, name: &str) -> Option<String> {
    extra.first_text(name).or_else(|| {
        extra
            .names()
            .find(|n| n.eq_ignore_ascii_case(name))
            .and_then(|n| extra.first_text(n))
    })
}

/// The target's current record for a principal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetPrincipal {
    pub login: String,
    /// Account lock state on the target.
    pub disabled: bool,
    #[serde(default)]
    pub attributes: AttributeSet,
}

/// The target's current record for a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetGroup {
    pub name: String,
    pub description: Option<String>,
    /// Direct user members.
    #[serde(default)]
    pub member_users: BTreeSet<String>,
    /// Direct group members.
    #[serde(default)]
    pub member_groups: BTreeSet<String>,
}

/// Everything needed to create a principal on the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPrincipal {
    pub login: String,
    pub given_name: String,
    pub surname: String,
    pub common_name: String,
    /// Optional attributes (`mail`, `uidnumber`, ...).
    #[serde(default)]
    pub attributes: AttributeSet,
}
