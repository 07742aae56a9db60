//! Group reconciliation.

use idsync_connector::model::{Lookup, TargetGroup};

use crate::action::{EntityKind, SyncAction};
use crate::mapping::MappedGroup;

/// Attributes carried on group creation.
const GROUP_CREATE_ATTRIBUTES: &[&str] = &["description", "gidnumber"];

/// Make a source group name acceptable as a target group key.
///
/// Spaces become `-`; parentheses are dropped.
pub fn sanitize_group_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '(' && *c != ')')
        .map(|c| if c == ' ' { '-' } else { c })
        .collect()
}

/// Diff one mapped group against the target.
///
/// Groups are create-only unless `force` is set, in which case the
/// description is overwritten.
pub fn reconcile_group(
    mapped: &MappedGroup,
    key: &str,
    current: Lookup<&TargetGroup>,
    force: bool,
) -> SyncAction {
    match current {
        Lookup::NotFound => SyncAction::Create {
            entity: EntityKind::Group,
            key: key.to_string(),
            names: None,
            attributes: mapped.attributes.select(GROUP_CREATE_ATTRIBUTES),
        },
        Lookup::Found(_) if !force => SyncAction::Skip {
            entity: EntityKind::Group,
            key: key.to_string(),
            reason: "already exists".to_string(),
        },
        Lookup::Found(_) => {
            let attributes = mapped.attributes.select(&["description"]);
            if attributes.is_empty() {
                SyncAction::NoOp {
                    entity: EntityKind::Group,
                    key: key.to_string(),
                }
            } else {
                SyncAction::UpdateAttributes {
                    entity: EntityKind::Group,
                    key: key.to_string(),
                    attributes,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idsync_connector::operation::AttributeSet;

    fn mapped() -> MappedGroup {
        MappedGroup {
            name: "Domain Admins".into(),
            attributes: AttributeSet::new()
                .with("description", "Admins")
                .with("gidnumber", 200_512u32)
                .with("cn", "ignored"),
            gid_number_derived: true,
            members: vec![],
        }
    }

    #[test]
    fn test_sanitize_group_name() {
        assert_eq!(sanitize_group_name("Domain Admins"), "Domain-Admins");
        assert_eq!(sanitize_group_name("Sales (EU)"), "Sales-EU");
        assert_eq!(sanitize_group_name("plain"), "plain");
    }

    #[test]
    fn test_create_when_missing() {
        match reconcile_group(&mapped(), "Domain-Admins", Lookup::NotFound, false) {
            SyncAction::Create {
                key, attributes, ..
            } => {
                assert_eq!(key, "Domain-Admins");
                assert_eq!(attributes.len(), 2);
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[test]
    fn test_existing_group_is_skipped_without_force() {
        let existing = TargetGroup::default();
        let action = reconcile_group(&mapped(), "Domain-Admins", Lookup::Found(&existing), false);
        assert!(matches!(action, SyncAction::Skip { .. }));
    }

    #[test]
    fn test_force_updates_description_only() {
        let existing = TargetGroup::default();
        match reconcile_group(&mapped(), "Domain-Admins", Lookup::Found(&existing), true) {
            SyncAction::UpdateAttributes { attributes, .. } => {
                assert_eq!(attributes.names().collect::<Vec<_>>(), vec!["description"]);
            }
            other => panic!("expected update, got {other:?}"),
        }
    }
}
