//! CLI commands.

use idsync_connector::traits::{SourceDirectory, TargetDirectory};
use idsync_connector_entra::EntraSource;
use idsync_connector_freeipa::{FreeIpaConfig, FreeIpaTarget};
use idsync_connector_ldap::AdSource;
use std::sync::Arc;

use crate::config::SourceConfig;
use crate::error::{CliError, CliResult};

pub mod show_id;
pub mod sync;
pub mod test;

/// Build the configured source directory.
pub fn build_source(config: &SourceConfig) -> CliResult<Arc<dyn SourceDirectory>> {
    let source: Arc<dyn SourceDirectory> = match config {
        SourceConfig::ActiveDirectory(c) => Arc::new(AdSource::new(c.clone()).map_err(invalid)?),
        SourceConfig::Entra(c) => Arc::new(EntraSource::new(c.clone()).map_err(invalid)?),
    };
    Ok(source)
}

/// Build the FreeIPA target.
pub fn build_target(config: &FreeIpaConfig) -> CliResult<Arc<dyn TargetDirectory>> {
    Ok(Arc::new(FreeIpaTarget::new(config.clone()).map_err(invalid)?))
}

fn invalid(e: idsync_connector::error::ConnectorError) -> CliError {
    CliError::InvalidConfig(e.to_string())
}
