//! Principal reconciliation.

use idsync_connector::model::{Lookup, TargetPrincipal};

use crate::action::{EntityKind, PositionalNames, SyncAction};
use crate::mapping::{MappedPrincipal, OPTIONAL_PRINCIPAL_ATTRIBUTES};

/// Attributes overwritten on an existing principal when forced.
const FORCED_NAME_ATTRIBUTES: &[&str] = &["givenname", "sn"];

/// Diff one mapped principal against the target's current record.
///
/// A missing principal is created, followed by a `Disable` when the source
/// account is disabled. An existing principal always gets exactly one status
/// decision (`Enable`, `Disable` or `NoOp`); with `force` it is preceded by
/// an `UpdateAttributes` carrying every mapped optional attribute.
pub fn reconcile_principal(
    mapped: &MappedPrincipal,
    current: Lookup<&TargetPrincipal>,
    force: bool,
) -> Vec<SyncAction> {
    let key = mapped.login.clone();
    match current {
        Lookup::NotFound => {
            let given_name = mapped.attribute("givenname").unwrap_or_else(|| key.clone());
            let surname = mapped.attribute("sn").unwrap_or_else(|| key.clone());
            let common_name = mapped.attribute("cn").unwrap_or_else(|| key.clone());

            let mut actions = vec![SyncAction::Create {
                entity: EntityKind::User,
                key: key.clone(),
                names: Some(PositionalNames {
                    given_name,
                    surname,
                    common_name,
                }),
                attributes: mapped.attributes.select(OPTIONAL_PRINCIPAL_ATTRIBUTES),
            }];
            if mapped.disabled {
                actions.push(SyncAction::Disable { key });
            }
            actions
        }
        Lookup::Found(existing) => {
            let mut actions = Vec::with_capacity(2);
            if force {
                let names: Vec<&str> = FORCED_NAME_ATTRIBUTES
                    .iter()
                    .chain(OPTIONAL_PRINCIPAL_ATTRIBUTES)
                    .copied()
                    .collect();
                let attributes = mapped.attributes.select(&names);
                if !attributes.is_empty() {
                    actions.push(SyncAction::UpdateAttributes {
                        entity: EntityKind::User,
                        key: key.clone(),
                        attributes,
                    });
                }
            }
            let status = match (mapped.disabled, existing.disabled) {
                (true, false) => SyncAction::Disable { key },
                (false, true) => SyncAction::Enable { key },
                _ => SyncAction::NoOp {
                    entity: EntityKind::User,
                    key,
                },
            };
            actions.push(status);
            actions
        }
    }
}
