//! Membership reconciliation.
//!
//! Additive only: members present on the target but absent from the source
//! are never removed.

use idsync_connector::model::{Lookup, MemberKind, MemberReference, ResolvedReference, TargetGroup};
use idsync_connector::traits::SourceDirectory;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::action::SyncAction;
use crate::group::sanitize_group_name;
use crate::statistics::RunContext;

/// Desired members of one group, by target key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredMembers {
    pub users: BTreeSet<String>,
    pub groups: BTreeSet<String>,
}

impl DesiredMembers {
    /// Partition resolved references into user and group names.
    ///
    /// Group names are sanitized so they match the keys used by the group
    /// phase.
    pub fn from_resolved<I>(resolved: I) -> Self
    where
        I: IntoIterator<Item = ResolvedReference>,
    {
        let mut desired = Self::default();
        for reference in resolved {
            match reference.kind {
                MemberKind::User => {
                    desired.users.insert(reference.name);
                }
                MemberKind::Group => {
                    desired.groups.insert(sanitize_group_name(&reference.name));
                }
            }
        }
        desired
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty()
    }
}

/// Resolve the member references of one group.
///
/// Resolutions are memoized in the run context. Unresolvable references and
/// resolver failures are skipped.
pub async fn resolve_members(
    source: &dyn SourceDirectory,
    group: &str,
    references: &[MemberReference],
    ctx: &mut RunContext,
) -> DesiredMembers {
    let mut resolved = Vec::with_capacity(references.len());
    for reference in references {
        if let Some(cached) = ctx.cached_resolution(reference) {
            if let Lookup::Found(r) = cached {
                resolved.push(r.clone());
            }
            continue;
        }
        match source.resolve_reference(reference).await {
            Ok(lookup) => {
                match &lookup {
                    Lookup::Found(r) => resolved.push(r.clone()),
                    Lookup::NotFound => {
                        debug!(group = %group, member = %reference, "Could not resolve member, skipping");
                    }
                }
                ctx.cache_resolution(reference.clone(), lookup);
            }
            Err(e) => {
                warn!(group = %group, member = %reference, error = %e, "Failed to resolve member");
            }
        }
    }
    DesiredMembers::from_resolved(resolved)
}

/// Emit one `AddMember` per desired member missing from `current`.
///
/// Names compare case-insensitively; the target folds keys to lower case.
/// Users come first, then groups, each in sorted order.
pub fn reconcile_membership(
    group_key: &str,
    desired: &DesiredMembers,
    current: &TargetGroup,
) -> Vec<SyncAction> {
    let users = missing(&desired.users, &current.member_users).map(|name| (name, MemberKind::User));
    let groups =
        missing(&desired.groups, &current.member_groups).map(|name| (name, MemberKind::Group));

    users
        .chain(groups)
        .map(|(name, kind)| SyncAction::AddMember {
            group: group_key.to_string(),
            member: name.clone(),
            kind,
        })
        .collect()
}

fn missing<'a>(
    desired: &'a BTreeSet<String>,
    current: &BTreeSet<String>,
) -> impl Iterator<Item = &'a String> {
    let present: BTreeSet<String> = current.iter().map(|n| n.to_lowercase()).collect();
    desired
        .iter()
        .filter(move |name| !present.contains(&name.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_resolved_sanitizes_group_names() {
        let desired = DesiredMembers::from_resolved(vec![
            ResolvedReference::user("jdoe"),
            ResolvedReference::group("Sales (EU)"),
        ]);
        assert!(desired.users.contains("jdoe"));
        assert!(desired.groups.contains("Sales-EU"));
    }

    #[test]
    fn test_only_missing_members_added_in_order() {
        let desired = DesiredMembers::from_resolved(vec![
            ResolvedReference::user("zed"),
            ResolvedReference::user("amy"),
            ResolvedReference::user("bob"),
            ResolvedReference::group("ops"),
        ]);
        let mut current = TargetGroup::default();
        current.member_users.insert("bob".into());
        current.member_users.insert("legacy".into());

        let actions = reconcile_membership("engineers", &desired, &current);
        let members: Vec<_> = actions
            .iter()
            .map(|a| match a {
                SyncAction::AddMember { member, kind, .. } => (member.as_str(), *kind),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            members,
            vec![
                ("amy", MemberKind::User),
                ("zed", MemberKind::User),
                ("ops", MemberKind::Group)
            ]
        );
    }

    #[test]
    fn test_members_match_regardless_of_case() {
        let desired = DesiredMembers::from_resolved(vec![
            ResolvedReference::user("JDoe"),
            ResolvedReference::group("Ops"),
        ]);
        let mut current = TargetGroup::default();
        current.member_users.insert("jdoe".into());
        current.member_groups.insert("ops".into());
        assert!(reconcile_membership("eng", &desired, &current).is_empty());
    }

    #[test]
    fn test_up_to_date_group_yields_nothing() {
        let desired = DesiredMembers::from_resolved(vec![ResolvedReference::user("jdoe")]);
        let mut current = TargetGroup::default();
        current.member_users.insert("jdoe".into());
        assert!(reconcile_membership("g", &desired, &current).is_empty());
    }
}
