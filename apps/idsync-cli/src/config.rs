//! Configuration file loading and validation.

use idsync_connector::config::CollaboratorConfig;
use idsync_connector_entra::EntraConfig;
use idsync_connector_freeipa::FreeIpaConfig;
use idsync_connector_ldap::AdConfig;
use idsync_engine::config::SyncConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{CliError, CliResult};

/// Sections that must be present in every configuration file.
const REQUIRED_SECTIONS: [&str; 2] = ["source", "target"];

/// The whole configuration file.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub target: FreeIpaConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The directory to read from, selected by `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    ActiveDirectory(AdConfig),
    Entra(EntraConfig),
}

impl SourceConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            SourceConfig::ActiveDirectory(_) => "active_directory",
            SourceConfig::Entra(_) => "entra",
        }
    }

    fn validate(&self) -> CliResult<()> {
        let result = match self {
            SourceConfig::ActiveDirectory(c) => c.validate(),
            SourceConfig::Entra(c) => c.validate(),
        };
        result.map_err(|e| CliError::InvalidConfig(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `idsync_engine=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Also append log lines to this file.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

impl AppConfig {
    /// Read, parse and validate a configuration file.
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CliError::Config(format!("configuration file not found: {}", path.display()))
            } else {
                CliError::Config(format!("cannot read {}: {e}", path.display()))
            }
        })?;
        Self::from_yaml(&text)
    }

    /// Parse and validate configuration text.
    pub fn from_yaml(text: &str) -> CliResult<Self> {
        let document: serde_yaml::Value = serde_yaml::from_str(text)?;
        let mapping = document
            .as_mapping()
            .ok_or_else(|| CliError::InvalidConfig("top level must be a mapping".to_string()))?;
        for section in REQUIRED_SECTIONS {
            if !mapping.contains_key(section) {
                return Err(CliError::InvalidConfig(format!(
                    "missing required section: {section}"
                )));
            }
        }

        let config: AppConfig = serde_yaml::from_value(document)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CliResult<()> {
        self.source.validate()?;
        self.target
            .validate()
            .map_err(|e| CliError::InvalidConfig(e.to_string()))?;
        self.sync
            .validate()
            .map_err(|e| CliError::InvalidConfig(e.to_string()))?;
        Ok(())
    }
}
