//! idsync command-line interface.
//!
//! ```text
//! idsync [--config <path>] [--verbose] sync [--dry-run] [--force-users] [--force-groups] [--json]
//! idsync [--config <path>] test
//! idsync [--config <path>] show-id --user <login>
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

pub use config::AppConfig;
pub use error::{CliError, CliResult};

/// Sync users, groups and memberships from a directory into FreeIPA
#[derive(Parser, Debug)]
#[command(name = "idsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "IDSYNC_CONFIG",
        default_value = "config.yaml"
    )]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a sync
    Sync(commands::sync::SyncArgs),

    /// Check connectivity and credentials for source and target
    Test(commands::test::TestArgs),

    /// Show how a user's numeric identities are derived
    ShowId(commands::show_id::ShowIdArgs),
}

/// Load configuration, initialize logging and dispatch the command.
pub async fn run(cli: Cli) -> CliResult<()> {
    let config = AppConfig::load(&cli.config)?;
    logging::init(&config.logging, cli.verbose)?;
    tracing::debug!(config = %cli.config.display(), "Configuration loaded");

    match cli.command {
        Commands::Sync(args) => commands::sync::execute(args, config).await,
        Commands::Test(args) => commands::test::execute(args, config).await,
        Commands::ShowId(args) => commands::show_id::execute(args, config).await,
    }
}
