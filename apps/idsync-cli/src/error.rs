//! CLI error types and exit codes

use idsync_connector::error::ConnectorError;
use idsync_engine::error::SyncError;
use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// The configuration file is missing or unreadable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configuration file parsed but is not usable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Source error: {0}")]
    Connector(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl CliError {
    /// Process exit code. Every failure exits with 1.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {self}");
        } else {
            eprintln!("Error: {self}");
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {suggestion}");
            } else {
                eprintln!("\nSuggestion: {suggestion}");
            }
        }
    }

    /// Get a suggested action for this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::Config(_) => Some("Pass --config <path> or set IDSYNC_CONFIG."),
            CliError::ConnectionFailed(_) | CliError::Sync(SyncError::Connection { .. }) => {
                Some("Run 'idsync test' to check connectivity and credentials.")
            }
            CliError::NotFound(_) => {
                Some("Check the login name. Active Directory expects the sAMAccountName.")
            }
            _ => None,
        }
    }
}

impl From<ConnectorError> for CliError {
    fn from(e: ConnectorError) -> Self {
        if e.is_connection_error() {
            CliError::ConnectionFailed(e.to_string())
        } else {
            CliError::Connector(e.to_string())
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Config(format!("I/O error: {e}"))
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(e: serde_yaml::Error) -> Self {
        CliError::InvalidConfig(format!("YAML error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_exits_with_one() {
        let errors = [
            CliError::Config("missing".into()),
            CliError::InvalidConfig("bad".into()),
            CliError::ConnectionFailed("down".into()),
            CliError::NotFound("jdoe".into()),
            CliError::Sync(SyncError::configuration("bad range")),
        ];
        for e in errors {
            assert_eq!(e.exit_code(), 1, "{e}");
        }
    }

    #[test]
    fn test_connection_error_conversion() {
        let e: CliError = ConnectorError::AuthenticationFailed.into();
        assert!(matches!(e, CliError::ConnectionFailed(_)));
        let e: CliError = ConnectorError::operation_failed("boom").into();
        assert!(matches!(e, CliError::Connector(_)));
    }

    #[test]
    fn test_suggestions() {
        assert!(CliError::Config("x".into()).suggestion().is_some());
        let e = CliError::Sync(SyncError::connection(
            "FreeIPA",
            ConnectorError::AuthenticationFailed,
        ));
        assert_eq!(
            e.suggestion(),
            Some("Run 'idsync test' to check connectivity and credentials.")
        );
        assert!(CliError::Validation("x".into()).suggestion().is_none());
    }
}
