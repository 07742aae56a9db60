//! Graph resources and their conversion into source records.

use idsync_connector::model::{MemberKind, ResolvedReference, SourceGroup, SourcePrincipal};
use idsync_connector::sid::SecurityIdentifier;
use serde::Deserialize;
use tracing::warn;

/// `@odata.type` of a user object.
pub const ODATA_TYPE_USER: &str = "#microsoft.graph.user";
/// `@odata.type` of a group object.
pub const ODATA_TYPE_GROUP: &str = "#microsoft.graph.group";

/// Properties requested for users.
pub const USER_SELECT: &str = "id,userPrincipalName,displayName,givenName,surname,mail,\
jobTitle,department,businessPhones,accountEnabled,onPremisesSecurityIdentifier";
/// Properties requested for groups.
pub const GROUP_SELECT: &str = "id,displayName,description,onPremisesSecurityIdentifier";
/// Properties requested for group members.
pub const MEMBER_SELECT: &str = "id,userPrincipalName,displayName";

/// A Graph user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphUser {
    pub id: String,
    pub user_principal_name: Option<String>,
    pub display_name: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub mail: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    #[serde(default)]
    pub business_phones: Vec<String>,
    pub account_enabled: Option<bool>,
    pub on_premises_security_identifier: Option<String>,
}

/// A Graph group.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphGroup {
    pub id: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub on_premises_security_identifier: Option<String>,
}

/// Any directory object, as returned by member listings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryObject {
    pub id: String,
    #[serde(rename = "@odata.type")]
    pub odata_type: Option<String>,
    pub user_principal_name: Option<String>,
    pub display_name: Option<String>,
}

impl DirectoryObject {
    /// Classify into a member reference; devices, service principals and
    /// other object types yield `None`.
    pub fn classify(&self) -> Option<ResolvedReference> {
        match self.odata_type.as_deref()? {
            ODATA_TYPE_USER => {
                let login = login_from_upn(self.user_principal_name.as_deref()?)?;
                Some(ResolvedReference::user(login))
            }
            ODATA_TYPE_GROUP => {
                let name = normalize_group_name(self.display_name.as_deref()?);
                (!name.is_empty()).then(|| ResolvedReference {
                    kind: MemberKind::Group,
                    name,
                })
            }
            _ => None,
        }
    }
}

/// Login name: the local part of a user principal name.
pub fn login_from_upn(upn: &str) -> Option<String> {
    let local = upn.split('@').next().unwrap_or_default().trim();
    (!local.is_empty()).then(|| local.to_string())
}

/// Group names are the display name lowercased with spaces turned into dashes.
pub fn normalize_group_name(display_name: &str) -> String {
    display_name.trim().to_lowercase().replace(' ', "-")
}

fn parse_sid(object_id: &str, text: Option<&str>) -> Option<SecurityIdentifier> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }
    let sid = SecurityIdentifier::parse(text);
    if sid.is_none() {
        warn!(object_id = %object_id, sid = %text, "Ignoring malformed on-premises SID");
    }
    sid
}

/// Defaults applied to every converted user.
#[derive(Debug, Clone)]
pub struct UserDefaults {
    pub login_shell: String,
    pub home_base: String,
}

impl GraphUser {
    /// Convert to a source principal. Users without a UPN are unusable.
    pub fn into_principal(self, defaults: &UserDefaults) -> Option<SourcePrincipal> {
        let upn = self.user_principal_name?;
        let login = login_from_upn(&upn)?;
        let sid = parse_sid(&self.id, self.on_premises_security_identifier.as_deref());
        let home_directory = format!("{}/{}", defaults.home_base.trim_end_matches('/'), login);

        Some(SourcePrincipal {
            source_id: Some(self.id),
            given_name: self.given_name,
            surname: self.surname,
            display_name: self.display_name,
            mail: self.mail.filter(|m| !m.trim().is_empty()).or(Some(upn)),
            telephone_number: self.business_phones.into_iter().next(),
            title: self.job_title,
            department: self.department,
            login_shell: Some(defaults.login_shell.clone()),
            home_directory: Some(home_directory),
            sid,
            disabled: !self.account_enabled.unwrap_or(true),
            login,
            ..Default::default()
        })
    }
}

impl GraphGroup {
    /// Convert to a source group; members are attached by the caller.
    pub fn into_group(self) -> Option<SourceGroup> {
        let display_name = self.display_name?;
        let name = normalize_group_name(&display_name);
        if name.is_empty() {
            return None;
        }
        let sid = parse_sid(&self.id, self.on_premises_security_identifier.as_deref());
        Some(SourceGroup {
            name,
            source_id: Some(self.id),
            description: self
                .description
                .filter(|d| !d.trim().is_empty())
                .or(Some(display_name)),
            sid,
            ..Default::default()
        })
    }
}
