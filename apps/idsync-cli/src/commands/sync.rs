//! Sync command - run a reconciliation

use clap::Args;
use idsync_engine::config::RunOptions;
use idsync_engine::orchestrator::SyncOrchestrator;
use tracing::warn;

use crate::commands::{build_source, build_target};
use crate::config::AppConfig;
use crate::error::CliResult;

/// Arguments for the sync command
#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Log intended changes without applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Overwrite attributes of users that already exist in FreeIPA
    #[arg(long)]
    pub force_users: bool,

    /// Overwrite attributes of groups that already exist in FreeIPA
    #[arg(long)]
    pub force_groups: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            force_users: self.force_users,
            force_groups: self.force_groups,
        }
    }
}

/// Execute the sync command
pub async fn execute(args: SyncArgs, config: AppConfig) -> CliResult<()> {
    let source = build_source(&config.source)?;
    let target = build_target(&config.target)?;
    let orchestrator = SyncOrchestrator::new(source, target, config.sync);

    let report = orchestrator.run(args.run_options()).await?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&report.to_json())
            .unwrap_or_else(|_| report.to_json().to_string());
        println!("{rendered}");
    }

    if report.stats.has_errors() {
        warn!(
            errors = report.stats.total_errors(),
            "Sync finished with per-entity errors; see the log above"
        );
    }
    Ok(())
}
