//! Conversion of LDAP search entries into source records.

use idsync_connector::model::{MemberReference, SourceGroup, SourcePrincipal};
use idsync_connector::operation::{AttributeSet, AttributeValue};
use idsync_connector::sid::{RawSid, SecurityIdentifier};
use ldap3::SearchEntry;
use tracing::{debug, warn};

/// `userAccountControl` flag: the account is disabled.
pub const UF_ACCOUNTDISABLE: u32 = 0x0002;

/// Attributes requested for users.
pub const USER_ATTRIBUTES: &[&str] = &[
    "sAMAccountName",
    "givenName",
    "sn",
    "mail",
    "displayName",
    "telephoneNumber",
    "title",
    "department",
    "userAccountControl",
    "uidNumber",
    "gidNumber",
    "loginShell",
    "unixHomeDirectory",
    "objectSid",
    "primaryGroupID",
];

/// Attributes requested for groups.
pub const GROUP_ATTRIBUTES: &[&str] = &[
    "sAMAccountName",
    "cn",
    "description",
    "member",
    "gidNumber",
    "objectSid",
];

/// Whether the account-control bitmask marks the account disabled.
pub fn is_disabled(user_account_control: u32) -> bool {
    user_account_control & UF_ACCOUNTDISABLE != 0
}

fn values<'a>(entry: &'a SearchEntry, name: &str) -> Option<&'a Vec<String>> {
    entry
        .attrs
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

fn first(entry: &SearchEntry, name: &str) -> Option<String> {
    values(entry, name)
        .and_then(|v| v.first())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn first_number(entry: &SearchEntry, name: &str) -> Option<u32> {
    let raw = first(entry, name)?;
    match raw.parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(dn = %entry.dn, attribute = name, value = %raw, "Ignoring non-numeric attribute");
            None
        }
    }
}

/// Read `objectSid` from the binary or the text attributes.
///
/// Text values starting with `S-` are parsed as the textual form; other text
/// is taken as the raw bytes.
pub fn read_sid(entry: &SearchEntry) -> Option<SecurityIdentifier> {
    let raw = entry
        .bin_attrs
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("objectSid"))
        .and_then(|(_, v)| v.first())
        .map(|bytes| RawSid::Binary(bytes.clone()))
        .or_else(|| {
            values(entry, "objectSid")
                .and_then(|v| v.first())
                .map(|s| {
                    if s.starts_with("S-") {
                        RawSid::Text(s.clone())
                    } else {
                        RawSid::Binary(s.as_bytes().to_vec())
                    }
                })
        })?;

    let sid = raw.normalize();
    if sid.is_none() {
        warn!(dn = %entry.dn, "Malformed objectSid, numeric identities will not be derived");
    }
    sid
}

fn residual(entry: &SearchEntry, known: &[&str]) -> AttributeSet {
    entry
        .attrs
        .iter()
        .filter(|(k, _)| !known.iter().any(|n| n.eq_ignore_ascii_case(k)))
        .map(|(k, v)| {
            let value = match v.as_slice() {
                [single] => AttributeValue::String(single.clone()),
                many => AttributeValue::from(many.to_vec()),
            };
            (k.clone(), value)
        })
        .collect()
}

/// Build a principal from a user entry. Entries without `sAMAccountName`
/// are dropped.
pub fn entry_to_principal(entry: &SearchEntry) -> Option<SourcePrincipal> {
    let Some(login) = first(entry, "sAMAccountName") else {
        debug!(dn = %entry.dn, "Entry has no sAMAccountName, dropping");
        return None;
    };

    let uac = first_number(entry, "userAccountControl").unwrap_or(0);
    Some(SourcePrincipal {
        login,
        source_id: Some(entry.dn.clone()),
        given_name: first(entry, "givenName"),
        surname: first(entry, "sn"),
        display_name: first(entry, "displayName"),
        mail: first(entry, "mail"),
        telephone_number: first(entry, "telephoneNumber"),
        title: first(entry, "title"),
        department: first(entry, "department"),
        login_shell: first(entry, "loginShell"),
        home_directory: first(entry, "unixHomeDirectory"),
        uid_number: first_number(entry, "uidNumber"),
        gid_number: first_number(entry, "gidNumber"),
        primary_group_id: first_number(entry, "primaryGroupID"),
        sid: read_sid(entry),
        disabled: is_disabled(uac),
        extra: residual(entry, USER_ATTRIBUTES),
    })
}

/// Build a group from a group entry. Entries without `sAMAccountName` are
/// dropped.
pub fn entry_to_group(entry: &SearchEntry) -> Option<SourceGroup> {
    let Some(name) = first(entry, "sAMAccountName") else {
        debug!(dn = %entry.dn, "Group entry has no sAMAccountName, dropping");
        return None;
    };

    let members = values(entry, "member")
        .map(|dns| dns.iter().map(MemberReference::new).collect())
        .unwrap_or_default();

    Some(SourceGroup {
        name,
        source_id: Some(entry.dn.clone()),
        description: first(entry, "description"),
        gid_number: first_number(entry, "gidNumber"),
        sid: read_sid(entry),
        members,
        extra: residual(entry, GROUP_ATTRIBUTES),
    })
}

/// Whether an entry's `objectClass` marks it as a group.
pub fn is_group_entry(entry: &SearchEntry) -> bool {
    values(entry, "objectClass")
        .map(|classes| classes.iter().any(|c| c.eq_ignore_ascii_case("group")))
        .unwrap_or(false)
}

/// Login or group name of a resolved member entry.
pub fn entry_name(entry: &SearchEntry) -> Option<String> {
    first(entry, "sAMAccountName")
}
