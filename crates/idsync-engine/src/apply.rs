//! Applying decisions to the target.

use idsync_connector::error::{ConnectorError, ConnectorResult};
use idsync_connector::traits::TargetDirectory;
use tracing::{debug, info};

use crate::action::{EntityKind, SyncAction};

/// What happened when an action was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The target was mutated.
    Applied,
    /// The target already matched; nothing changed.
    AlreadyInPlace,
    /// Dry-run: the intent was logged, the target was not called.
    Recorded,
}

impl ApplyOutcome {
    /// Whether the action's effect now holds (or would hold, in dry-run).
    pub fn took_effect(self) -> bool {
        matches!(self, ApplyOutcome::Applied | ApplyOutcome::Recorded)
    }
}

/// Applies actions against a target, or records them in dry-run.
pub struct ActionApplier<'a> {
    target: &'a dyn TargetDirectory,
    dry_run: bool,
}

impl<'a> ActionApplier<'a> {
    pub fn new(target: &'a dyn TargetDirectory, dry_run: bool) -> Self {
        Self { target, dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Apply one action.
    ///
    /// A create conflict is a no-op success.
    pub async fn apply(&self, action: &SyncAction) -> ConnectorResult<ApplyOutcome> {
        if !action.is_mutating() {
            debug!("{}", action.describe_done());
            return Ok(ApplyOutcome::AlreadyInPlace);
        }
        if self.dry_run {
            info!("[DRY RUN] Would {action}");
            return Ok(ApplyOutcome::Recorded);
        }

        match self.call_target(action).await {
            Ok(()) => {
                info!("{}", action.describe_done());
                Ok(ApplyOutcome::Applied)
            }
            Err(ConnectorError::ObjectAlreadyExists { identifier }) => {
                info!(entity = %identifier, "Already exists on target, nothing to do");
                Ok(ApplyOutcome::AlreadyInPlace)
            }
            Err(e) => Err(e),
        }
    }

    async fn call_target(&self, action: &SyncAction) -> ConnectorResult<()> {
        match action {
            SyncAction::Create {
                entity: EntityKind::User,
                ..
            } => {
                let request = action.new_principal().ok_or_else(|| ConnectorError::InvalidData {
                    message: "principal create without positional names".to_string(),
                })?;
                self.target.create_principal(&request).await
            }
            SyncAction::Create {
                entity: EntityKind::Group,
                key,
                attributes,
                ..
            } => self.target.create_group(key, attributes).await,
            SyncAction::UpdateAttributes {
                entity: EntityKind::User,
                key,
                attributes,
            } => self.target.update_principal_attributes(key, attributes).await,
            SyncAction::UpdateAttributes {
                entity: EntityKind::Group,
                key,
                attributes,
            } => self.target.update_group_attributes(key, attributes).await,
            SyncAction::Enable { key } => self.target.set_principal_enabled(key, true).await,
            SyncAction::Disable { key } => self.target.set_principal_enabled(key, false).await,
            SyncAction::AddMember {
                group,
                member,
                kind,
            } => self.target.add_group_member(group, member, *kind).await,
            SyncAction::Skip { .. } | SyncAction::NoOp { .. } => Ok(()),
        }
    }
}
