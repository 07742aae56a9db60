//! Reconciliation decisions.

use idsync_connector::model::{MemberKind, NewPrincipal};
use idsync_connector::operation::AttributeSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of entity an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Group,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => write!(f, "user"),
            EntityKind::Group => write!(f, "group"),
        }
    }
}

/// Positional identity fields required to create a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionalNames {
    pub given_name: String,
    pub surname: String,
    pub common_name: String,
}

/// One decision taken by a reconciler.
///
/// Actions are data: the applier turns them into target calls, or into
/// logged intents in dry-run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncAction {
    Create {
        entity: EntityKind,
        key: String,
        /// Present for principals.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        names: Option<PositionalNames>,
        attributes: AttributeSet,
    },
    UpdateAttributes {
        entity: EntityKind,
        key: String,
        attributes: AttributeSet,
    },
    Enable {
        key: String,
    },
    Disable {
        key: String,
    },
    AddMember {
        group: String,
        member: String,
        kind: MemberKind,
    },
    Skip {
        entity: EntityKind,
        key: String,
        reason: String,
    },
    NoOp {
        entity: EntityKind,
        key: String,
    },
}

impl SyncAction {
    /// Whether applying the action calls a mutating target operation.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, SyncAction::Skip { .. } | SyncAction::NoOp { .. })
    }

    /// Whether this is a `Create`.
    pub fn is_create(&self) -> bool {
        matches!(self, SyncAction::Create { .. })
    }

    /// Whether this is an `UpdateAttributes`.
    pub fn is_update(&self) -> bool {
        matches!(self, SyncAction::UpdateAttributes { .. })
    }

    /// Short name of the variant, for logs and counting.
    pub fn name(&self) -> &'static str {
        match self {
            SyncAction::Create { .. } => "create",
            SyncAction::UpdateAttributes { .. } => "update_attributes",
            SyncAction::Enable { .. } => "enable",
            SyncAction::Disable { .. } => "disable",
            SyncAction::AddMember { .. } => "add_member",
            SyncAction::Skip { .. } => "skip",
            SyncAction::NoOp { .. } => "no_op",
        }
    }

    /// Build the create request for a principal `Create`.
    pub fn new_principal(&self) -> Option<NewPrincipal> {
        match self {
            SyncAction::Create {
                entity: EntityKind::User,
                key,
                names: Some(names),
                attributes,
            } => Some(NewPrincipal {
                login: key.clone(),
                given_name: names.given_name.clone(),
                surname: names.surname.clone(),
                common_name: names.common_name.clone(),
                attributes: attributes.clone(),
            }),
            _ => None,
        }
    }

    /// Past-tense description used once the action was applied.
    pub fn describe_done(&self) -> String {
        match self {
            SyncAction::Create { entity, key, .. } => format!("Created {entity}: {key}"),
            SyncAction::UpdateAttributes { entity, key, .. } => format!("Updated {entity}: {key}"),
            SyncAction::Enable { key } => format!("Enabled user: {key}"),
            SyncAction::Disable { key } => format!("Disabled user: {key}"),
            SyncAction::AddMember {
                group,
                member,
                kind,
            } => format!("Added {kind} {member} to group {group}"),
            SyncAction::Skip { entity, key, reason } => format!("Skipped {entity} {key}: {reason}"),
            SyncAction::NoOp { entity, key } => format!("{entity} {key} unchanged"),
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncAction::Create {
                entity,
                key,
                attributes,
                ..
            } => {
                write!(f, "create {entity} {key}")?;
                if !attributes.is_empty() {
                    let names: Vec<_> = attributes.names().collect();
                    write!(f, " ({})", names.join(", "))?;
                }
                Ok(())
            }
            SyncAction::UpdateAttributes {
                entity,
                key,
                attributes,
            } => {
                let names: Vec<_> = attributes.names().collect();
                write!(f, "update {entity} {key} ({})", names.join(", "))
            }
            SyncAction::Enable { key } => write!(f, "enable user {key}"),
            SyncAction::Disable { key } => write!(f, "disable user {key}"),
            SyncAction::AddMember {
                group,
                member,
                kind,
            } => write!(f, "add {kind} {member} to group {group}"),
            SyncAction::Skip { entity, key, reason } => write!(f, "skip {entity} {key} ({reason})"),
            SyncAction::NoOp { entity, key } => write!(f, "leave {entity} {key} unchanged"),
        }
    }
}
