//! Attribute mapping from source records to target attribute sets.
//!
//! The mapper copies every configured `(source field -> target field)` pair
//! whose source value is present, then fills the derived defaults: synthesized
//! mail, numeric identities, login shell and home directory. It never fails;
//! anything it cannot produce is left out.

use idsync_connector::model::{MemberReference, SourceGroup, SourcePrincipal};
use idsync_connector::operation::AttributeSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{AttributeMappingTable, SyncConfig};
use crate::identity::{derive_from_relative, derive_identity};

/// Optional attributes carried on principal creation and forced updates.
pub const OPTIONAL_PRINCIPAL_ATTRIBUTES: &[&str] = &[
    "mail",
    "telephonenumber",
    "title",
    "uidnumber",
    "gidnumber",
    "loginshell",
    "homedirectory",
];

/// Options that shape the derived defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingOptions {
    pub id_range_base: u32,
    pub default_email_domain: Option<String>,
    pub default_login_shell: Option<String>,
    pub default_home_base: Option<String>,
}

impl From<&SyncConfig> for MappingOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            id_range_base: config.id_range_base,
            default_email_domain: config.default_email_domain.clone(),
            default_login_shell: config.default_login_shell.clone(),
            default_home_base: config.default_home_base.clone(),
        }
    }
}

/// A source principal projected onto target attribute names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedPrincipal {
    /// Source login; the target key for lookups and mutations.
    pub login: String,
    pub disabled: bool,
    /// Target-named attributes.
    pub attributes: AttributeSet,
    /// `uidnumber` was computed from the SID rather than read from the source.
    pub uid_number_derived: bool,
    /// `gidnumber` was computed rather than read from the source.
    pub gid_number_derived: bool,
}

impl MappedPrincipal {
    /// First value of a target attribute.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.first_text(name)
    }

    /// Target `uid`, falling back to the login.
    pub fn uid(&self) -> String {
        self.attribute("uid").unwrap_or_else(|| self.login.clone())
    }
}

/// A source group projected onto target attribute names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedGroup {
    /// Source-native group name, before sanitization.
    pub name: String,
    pub attributes: AttributeSet,
    pub gid_number_derived: bool,
    pub members: Vec<MemberReference>,
}

impl MappedGroup {
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.first_text(name)
    }
}

fn copy_mapped<F>(table: &AttributeMappingTable, lookup: F) -> AttributeSet
where
    F: Fn(&str) -> Option<String>,
{
    let mut attributes = AttributeSet::new();
    for (source_field, target_field) in table {
        if let Some(value) = lookup(source_field) {
            attributes.set(target_field.clone(), value);
        }
    }
    attributes
}

/// Map a source principal.
pub fn map_principal(
    source: &SourcePrincipal,
    table: &AttributeMappingTable,
    options: &MappingOptions,
) -> MappedPrincipal {
    let mut attributes = copy_mapped(table, |field| source.attribute(field));
    let login = source.login.clone();

    if attributes.first_text("mail").is_none() {
        if let (Some(domain), Some(uid)) =
            (&options.default_email_domain, attributes.first_text("uid"))
        {
            let mail = format!("{uid}@{domain}");
            debug!(user = %login, mail = %mail, "Generated email");
            attributes.set("mail", mail);
        }
    }

    let mut uid_number_derived = false;
    if !attributes.has("uidnumber") {
        if let Some(explicit) = source.uid_number {
            attributes.set("uidnumber", explicit);
        } else if let Some(sid) = &source.sid {
            match derive_identity(sid, options.id_range_base) {
                Some(uid_number) => {
                    debug!(user = %login, sid = %sid, uid_number, "Derived uidNumber from SID");
                    attributes.set("uidnumber", uid_number);
                    uid_number_derived = true;
                }
                None => warn!(
                    user = %login,
                    sid = %sid,
                    "uidNumber derivation overflowed, leaving it unset"
                ),
            }
        } else {
            debug!(user = %login, "No SID, uidNumber left unset");
        }
    }

    let mut gid_number_derived = false;
    if !attributes.has("gidnumber") {
        if let Some(explicit) = source.gid_number {
            attributes.set("gidnumber", explicit);
        } else if let Some(primary) = source.primary_group_id {
            match derive_from_relative(primary, options.id_range_base) {
                Some(gid_number) => {
                    debug!(user = %login, primary_group_id = primary, gid_number, "Derived gidNumber from primary group");
                    attributes.set("gidnumber", gid_number);
                    gid_number_derived = true;
                }
                None => warn!(
                    user = %login,
                    primary_group_id = primary,
                    "gidNumber derivation overflowed, leaving it unset"
                ),
            }
        }
    }

    if !attributes.has("loginshell") {
        if let Some(shell) = &options.default_login_shell {
            attributes.set("loginshell", shell.as_str());
        }
    }

    if !attributes.has("homedirectory") {
        if let Some(base) = &options.default_home_base {
            let uid = attributes.first_text("uid").unwrap_or_else(|| login.clone());
            attributes.set(
                "homedirectory",
                format!("{}/{}", base.trim_end_matches('/'), uid),
            );
        }
    }

    MappedPrincipal {
        login,
        disabled: source.disabled,
        attributes,
        uid_number_derived,
        gid_number_derived,
    }
}

/// Map a source group.
pub fn map_group(
    source: &SourceGroup,
    table: &AttributeMappingTable,
    options: &MappingOptions,
) -> MappedGroup {
    let mut attributes = copy_mapped(table, |field| source.attribute(field));

    let mut gid_number_derived = false;
    if !attributes.has("gidnumber") {
        if let Some(explicit) = source.gid_number {
            attributes.set("gidnumber", explicit);
        } else if let Some(sid) = &source.sid {
            if let Some(gid_number) = derive_identity(sid, options.id_range_base) {
                debug!(group = %source.name, gid_number, "Derived gidNumber from SID");
                attributes.set("gidnumber", gid_number);
                gid_number_derived = true;
            } else {
                warn!(group = %source.name, sid = %sid, "gidNumber derivation overflowed, leaving it unset");
            }
        }
    }

    MappedGroup {
        name: source.name.clone(),
        attributes,
        gid_number_derived,
        members: source.members.clone(),
    }
}
