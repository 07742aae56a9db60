//! Run-level errors.
//!
//! Only failures that abort a whole run surface here. Per-entity failures are
//! recorded in [`crate::statistics::SyncStats`] and never propagate.

use idsync_connector::error::ConnectorError;
use thiserror::Error;

/// Error that aborts a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A collaborator could not be reached or refused the session.
    #[error("connection to {system} failed: {source}")]
    Connection {
        system: String,
        #[source]
        source: ConnectorError,
    },

    /// Listing the source snapshot failed after a successful connect.
    #[error("failed to read {what} from source: {source}")]
    Source {
        what: String,
        #[source]
        source: ConnectorError,
    },

    /// Run configuration is invalid.
    #[error("invalid sync configuration: {message}")]
    Configuration { message: String },
}

impl SyncError {
    pub fn connection(system: impl Into<String>, source: ConnectorError) -> Self {
        SyncError::Connection {
            system: system.into(),
            source,
        }
    }

    pub fn source(what: impl Into<String>, source: ConnectorError) -> Self {
        SyncError::Source {
            what: what.into(),
            source,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        SyncError::Configuration {
            message: message.into(),
        }
    }

    /// Error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            SyncError::Connection { .. } => "CONNECTION_FAILED",
            SyncError::Source { .. } => "SOURCE_READ_FAILED",
            SyncError::Configuration { .. } => "INVALID_CONFIG",
        }
    }
}

/// Result type for run-level operations.
pub type SyncResult<T> = Result<T, SyncError>;
