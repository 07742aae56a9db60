//! Run statistics and per-run state.

use chrono::{DateTime, Utc};
use idsync_connector::model::{Lookup, MemberReference, ResolvedReference};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::{info, warn};

use crate::action::SyncAction;
use crate::config::RunOptions;

/// Phase of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Users,
    Groups,
    Memberships,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Users => write!(f, "users"),
            SyncPhase::Groups => write!(f, "groups"),
            SyncPhase::Memberships => write!(f, "memberships"),
        }
    }
}

/// Counters for users or groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounters {
    pub created: usize,
    pub updated: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Counters for membership additions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipCounters {
    pub added: usize,
    pub errors: usize,
}

/// Error details for a single entity that failed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecordError {
    /// User login or group name.
    pub entity: String,
    pub error: String,
    pub phase: SyncPhase,
}

/// Per-run counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStats {
    pub users: EntityCounters,
    pub groups: EntityCounters,
    pub memberships: MembershipCounters,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_details: Vec<SyncRecordError>,
}

impl SyncStats {
    /// Zeroed counters with the start timestamp set.
    pub fn start() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Run duration, once finished.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }

    /// Record a failed entity with error details.
    pub fn record_error(&mut self, phase: SyncPhase, entity: &str, error: &str) {
        match phase {
            SyncPhase::Users => self.users.errors += 1,
            SyncPhase::Groups => self.groups.errors += 1,
            SyncPhase::Memberships => self.memberships.errors += 1,
        }
        warn!(phase = %phase, entity = %entity, error = %error, "Sync record failed");
        self.error_details.push(SyncRecordError {
            entity: entity.to_string(),
            error: error.to_string(),
            phase,
        });
    }

    pub fn total_errors(&self) -> usize {
        self.users.errors + self.groups.errors + self.memberships.errors
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors() > 0
    }

    /// Log the summary block.
    pub fn log_summary(&self, dry_run: bool) {
        info!(dry_run, "=== Sync Summary ===");
        info!(
            created = self.users.created,
            updated = self.users.updated,
            enabled = self.users.enabled,
            disabled = self.users.disabled,
            skipped = self.users.skipped,
            errors = self.users.errors,
            "Users"
        );
        info!(
            created = self.groups.created,
            updated = self.groups.updated,
            skipped = self.groups.skipped,
            errors = self.groups.errors,
            "Groups"
        );
        info!(
            added = self.memberships.added,
            errors = self.memberships.errors,
            "Memberships"
        );
        if let Some(ms) = self.duration_ms() {
            info!(duration_ms = ms, "Run finished");
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::json!({}))
    }
}

/// State owned by one run: statistics, the decision log and memoized
/// member resolutions.
#[derive(Debug)]
pub struct RunContext {
    pub options: RunOptions,
    pub stats: SyncStats,
    pub decisions: Vec<SyncAction>,
    /// Groups with a `Create` decision in this run.
    pub planned_groups: BTreeSet<String>,
    resolved: HashMap<MemberReference, Lookup<ResolvedReference>>,
}

impl RunContext {
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            stats: SyncStats::start(),
            decisions: Vec::new(),
            planned_groups: BTreeSet::new(),
            resolved: HashMap::new(),
        }
    }

    pub fn record_decision(&mut self, action: &SyncAction) {
        self.decisions.push(action.clone());
    }

    /// Memoized resolution, if this reference was already resolved.
    pub fn cached_resolution(&self, reference: &MemberReference) -> Option<&Lookup<ResolvedReference>> {
        self.resolved.get(reference)
    }

    pub fn cache_resolution(&mut self, reference: MemberReference, resolved: Lookup<ResolvedReference>) {
        self.resolved.insert(reference, resolved);
    }

    /// Close the run and produce its report.
    pub fn into_report(mut self) -> SyncReport {
        self.stats.finish();
        SyncReport {
            dry_run: self.options.dry_run,
            stats: self.stats,
            decisions: self.decisions,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub dry_run: bool,
    pub stats: SyncStats,
    /// Every decision in the order it was taken.
    pub decisions: Vec<SyncAction>,
}

impl SyncReport {
    /// Count decisions matching a predicate.
    pub fn count_decisions(&self, predicate: impl Fn(&SyncAction) -> bool) -> usize {
        self.decisions.iter().filter(|a| predicate(a)).count()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_error_routes_to_phase() {
        let mut stats = SyncStats::start();
        stats.record_error(SyncPhase::Users, "jdoe", "boom");
        stats.record_error(SyncPhase::Memberships, "engineers", "boom");
        assert_eq!(stats.users.errors, 1);
        assert_eq!(stats.groups.errors, 0);
        assert_eq!(stats.memberships.errors, 1);
        assert_eq!(stats.total_errors(), 2);
        assert_eq!(stats.error_details[0].entity, "jdoe");
    }

    #[test]
    fn test_report_timestamps_and_json() {
        let ctx = RunContext::new(RunOptions::default());
        let report = ctx.into_report();
        assert!(report.stats.duration_ms().is_some());
        let json = report.to_json();
        assert_eq!(json["dry_run"], false);
        assert_eq!(json["stats"]["users"]["created"], 0);
        assert!(json["stats"].get("error_details").is_none());
    }

    #[test]
    fn test_resolution_cache() {
        let mut ctx = RunContext::new(RunOptions::default());
        let reference = MemberReference::new("CN=John,DC=example,DC=com");
        assert!(ctx.cached_resolution(&reference).is_none());
        ctx.cache_resolution(reference.clone(), Lookup::Found(ResolvedReference::user("jdoe")));
        assert!(ctx.cached_resolution(&reference).is_some());
    }
}
