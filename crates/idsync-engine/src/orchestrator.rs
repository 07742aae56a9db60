//! Sync orchestration.
//!
//! A run connects both collaborators, optionally provisions the identity
//! range, then runs the user, group and membership phases strictly in that
//! order. Failures of a single entity are recorded and the run moves on;
//! only connection failures and source listing failures abort it. A target
//! session lost in the middle of a phase counts as a connection failure.

use idsync_connector::error::ConnectorError;
use idsync_connector::model::{Lookup, SourceGroup, SourcePrincipal};
use idsync_connector::traits::{SourceDirectory, TargetDirectory};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::action::SyncAction;
use crate::apply::ActionApplier;
use crate::config::{RunOptions, SyncConfig};
use crate::error::{SyncError, SyncResult};
use crate::group::{reconcile_group, sanitize_group_name};
use crate::mapping::{map_group, map_principal, MappingOptions};
use crate::membership::{reconcile_membership, resolve_members};
use crate::principal::reconcile_principal;
use crate::statistics::{RunContext, SyncPhase, SyncReport};

/// Drives a sync run between one source and one target.
pub struct SyncOrchestrator {
    source: Arc<dyn SourceDirectory>,
    target: Arc<dyn TargetDirectory>,
    config: SyncConfig,
}

impl SyncOrchestrator {
    pub fn new(
        source: Arc<dyn SourceDirectory>,
        target: Arc<dyn TargetDirectory>,
        config: SyncConfig,
    ) -> Self {
        Self {
            source,
            target,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Execute one run.
    #[instrument(skip(self), fields(source = %self.source.display_name(), target = %self.target.display_name()))]
    pub async fn run(&self, options: RunOptions) -> SyncResult<SyncReport> {
        self.config.validate()?;
        info!(
            dry_run = options.dry_run,
            force_users = options.force_users,
            force_groups = options.force_groups,
            "Starting sync run"
        );

        self.source
            .connect()
            .await
            .map_err(|e| SyncError::connection(self.source.display_name(), e))?;
        if let Err(e) = self.target.connect().await {
            self.disconnect_source().await;
            return Err(SyncError::connection(self.target.display_name(), e));
        }

        let mut ctx = RunContext::new(options);
        let outcome = self.run_phases(&mut ctx).await;
        self.disconnect_target().await;
        self.disconnect_source().await;
        outcome?;

        let report = ctx.into_report();
        report.stats.log_summary(report.dry_run);
        Ok(report)
    }

    async fn disconnect_source(&self) {
        if let Err(e) = self.source.disconnect().await {
            warn!(error = %e, "Failed to disconnect from source");
        }
    }

    async fn disconnect_target(&self) {
        if let Err(e) = self.target.disconnect().await {
            warn!(error = %e, "Failed to disconnect from target");
        }
    }

    /// Record a per-entity failure, or abort the run if the target session
    /// is gone.
    fn entity_failed(
        &self,
        ctx: &mut RunContext,
        phase: SyncPhase,
        entity: &str,
        error: ConnectorError,
        context: Option<&str>,
    ) -> SyncResult<()> {
        if error.is_connection_error() {
            return Err(SyncError::connection(self.target.display_name(), error));
        }
        let message = match context {
            Some(context) => format!("{context} failed: {error}"),
            None => error.to_string(),
        };
        ctx.stats.record_error(phase, entity, &message);
        Ok(())
    }

    async fn run_phases(&self, ctx: &mut RunContext) -> SyncResult<()> {
        if self.config.ensure_id_range {
            self.ensure_identity_range(ctx).await?;
        }

        if self.config.sync_users {
            self.sync_users(ctx).await?;
        }

        if self.config.sync_groups || self.config.sync_group_memberships {
            let query = self.source.group_query();
            let groups = self
                .source
                .list_groups(&query)
                .await
                .map_err(|e| SyncError::source("groups", e))?;
            info!(count = groups.len(), "Retrieved groups from source");

            if self.config.sync_groups {
                self.sync_groups(&groups, ctx).await?;
            }
            if self.config.sync_group_memberships {
                self.sync_memberships(&groups, ctx).await?;
            }
        }
        Ok(())
    }

    async fn ensure_identity_range(&self, ctx: &RunContext) -> SyncResult<()> {
        let base = self.config.id_range_base;
        let size = self.config.id_range_size;
        let result = if ctx.options.dry_run {
            match self.target.identity_range_exists().await {
                Ok(true) => {
                    debug!(base, size, "Identity range in place");
                    Ok(())
                }
                Ok(false) => {
                    info!(base, size, "[DRY RUN] Would create identity range");
                    Ok(())
                }
                Err(e) => Err(e),
            }
        } else {
            self.target
                .ensure_identity_range(base, size)
                .await
                .map(|()| debug!(base, size, "Identity range in place"))
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_connection_error() => {
                Err(SyncError::connection(self.target.display_name(), e))
            }
            Err(e) => {
                warn!(base, size, error = %e, "Could not ensure identity range, continuing");
                Ok(())
            }
        }
    }

    async fn sync_users(&self, ctx: &mut RunContext) -> SyncResult<()> {
        info!("=== Starting User Sync ===");
        let query = self.source.principal_query();
        let principals = self
            .source
            .list_principals(&query)
            .await
            .map_err(|e| SyncError::source("principals", e))?;
        info!(count = principals.len(), "Retrieved principals from source");

        let scope = self.config.user_scope();
        let mapping = MappingOptions::from(&self.config);
        for principal in &principals {
            if principal.login.trim().is_empty() {
                debug!(source_id = ?principal.source_id, "Principal without login, skipping");
                ctx.stats.users.skipped += 1;
                continue;
            }
            if !scope.allows(&principal.login) {
                debug!(user = %principal.login, "User out of scope, skipping");
                ctx.stats.users.skipped += 1;
                continue;
            }
            self.sync_principal(principal, &mapping, ctx).await?;
        }
        Ok(())
    }

    async fn sync_principal(
        &self,
        principal: &SourcePrincipal,
        mapping: &MappingOptions,
        ctx: &mut RunContext,
    ) -> SyncResult<()> {
        let mapped = map_principal(principal, &self.config.user_attribute_mapping, mapping);
        let login = mapped.login.clone();

        let current = match self.target.find_principal(&login).await {
            Ok(current) => current,
            Err(e) => return self.entity_failed(ctx, SyncPhase::Users, &login, e, None),
        };
        let is_new = !current.is_found();
        let actions = reconcile_principal(&mapped, current.as_ref(), ctx.options.force_users);

        let applier = ActionApplier::new(self.target.as_ref(), ctx.options.dry_run);
        let mut enabled = false;
        let mut disabled = false;
        for action in &actions {
            ctx.record_decision(action);
        }
        for action in &actions {
            match applier.apply(action).await {
                Ok(outcome) => match action {
                    SyncAction::Enable { .. } if outcome.took_effect() => enabled = true,
                    SyncAction::Disable { .. } if outcome.took_effect() && !is_new => {
                        disabled = true
                    }
                    _ => {}
                },
                Err(e) => {
                    return self.entity_failed(
                        ctx,
                        SyncPhase::Users,
                        &login,
                        e,
                        Some(action.name()),
                    );
                }
            }
        }

        if is_new {
            ctx.stats.users.created += 1;
        } else {
            ctx.stats.users.updated += 1;
            if enabled {
                ctx.stats.users.enabled += 1;
            }
            if disabled {
                ctx.stats.users.disabled += 1;
            }
        }
        Ok(())
    }

    async fn sync_groups(&self, groups: &[SourceGroup], ctx: &mut RunContext) -> SyncResult<()> {
        info!("=== Starting Group Sync ===");
        let scope = self.config.group_scope();
        let mapping = MappingOptions::from(&self.config);
        let applier = ActionApplier::new(self.target.as_ref(), ctx.options.dry_run);

        for group in groups {
            if group.name.trim().is_empty() || !scope.allows(&group.name) {
                debug!(group = %group.name, "Group out of scope, skipping");
                ctx.stats.groups.skipped += 1;
                continue;
            }
            let key = sanitize_group_name(&group.name);
            if key != group.name {
                debug!(from = %group.name, to = %key, "Sanitized group name");
            }
            let mapped = map_group(group, &self.config.group_attribute_mapping, &mapping);

            let current = match self.target.find_group(&key).await {
                Ok(current) => current,
                Err(e) => {
                    self.entity_failed(ctx, SyncPhase::Groups, &key, e, None)?;
                    continue;
                }
            };
            let action = reconcile_group(&mapped, &key, current.as_ref(), ctx.options.force_groups);
            ctx.record_decision(&action);
            if action.is_create() {
                ctx.planned_groups.insert(key.clone());
            }

            match applier.apply(&action).await {
                Ok(_) => match &action {
                    SyncAction::Create { .. } => ctx.stats.groups.created += 1,
                    SyncAction::UpdateAttributes { .. } => ctx.stats.groups.updated += 1,
                    _ => ctx.stats.groups.skipped += 1,
                },
                Err(e) => {
                    self.entity_failed(ctx, SyncPhase::Groups, &key, e, Some(action.name()))?
                }
            }
        }
        Ok(())
    }

    async fn sync_memberships(
        &self,
        groups: &[SourceGroup],
        ctx: &mut RunContext,
    ) -> SyncResult<()> {
        info!("=== Starting Group Membership Sync ===");
        let scope = self.config.group_scope();
        let applier = ActionApplier::new(self.target.as_ref(), ctx.options.dry_run);

        for group in groups {
            if group.name.trim().is_empty() || !scope.allows(&group.name) {
                continue;
            }
            let key = sanitize_group_name(&group.name);
            let desired =
                resolve_members(self.source.as_ref(), &key, &group.members, ctx).await;

            let current = match self.target.find_group(&key).await {
                Ok(Lookup::Found(current)) => current,
                Ok(Lookup::NotFound)
                    if ctx.options.dry_run && ctx.planned_groups.contains(&key) =>
                {
                    Default::default()
                }
                Ok(Lookup::NotFound) => {
                    ctx.stats.record_error(
                        SyncPhase::Memberships,
                        &key,
                        "group not found on target",
                    );
                    continue;
                }
                Err(e) => {
                    self.entity_failed(ctx, SyncPhase::Memberships, &key, e, None)?;
                    continue;
                }
            };

            let actions = reconcile_membership(&key, &desired, &current);
            if actions.is_empty() {
                debug!(group = %key, "Group membership up to date");
                continue;
            }
            for action in &actions {
                ctx.record_decision(action);
                match applier.apply(action).await {
                    Ok(outcome) if outcome.took_effect() => ctx.stats.memberships.added += 1,
                    Ok(_) => {}
                    Err(e) => {
                        let member = match action {
                            SyncAction::AddMember { member, .. } => member.as_str(),
                            _ => key.as_str(),
                        };
                        let entity = format!("{key}/{member}");
                        self.entity_failed(ctx, SyncPhase::Memberships, &entity, e, None)?;
                    }
                }
            }
        }
        Ok(())
    }
}
