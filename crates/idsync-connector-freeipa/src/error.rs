//! FreeIPA error types.

use idsync_connector::error::ConnectorError;
use thiserror::Error;

/// `NotFound`.
pub const CODE_NOT_FOUND: i64 = 4001;
/// `DuplicateEntry`.
pub const CODE_DUPLICATE_ENTRY: i64 = 4002;
/// `AlreadyActive`.
pub const CODE_ALREADY_ACTIVE: i64 = 4009;
/// `AlreadyInactive`.
pub const CODE_ALREADY_INACTIVE: i64 = 4010;
/// `EmptyModlist`: nothing to change.
pub const CODE_EMPTY_MODLIST: i64 = 4202;
/// `ACIError`: the bound user lacks rights.
pub const CODE_ACI_ERROR: i64 = 2100;

pub type FreeIpaResult<T> = Result<T, FreeIpaError>;

#[derive(Debug, Error)]
pub enum FreeIpaError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Login rejected or session expired.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error object returned by a JSON-RPC call.
    #[error("{method} failed: {name} ({code}): {message}")]
    Rpc {
        method: String,
        code: i64,
        name: String,
        message: String,
    },

    #[error("Unexpected response from {method}: {message}")]
    UnexpectedResponse { method: String, message: String },
}

impl FreeIpaError {
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            FreeIpaError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.rpc_code() == Some(CODE_NOT_FOUND)
    }

    pub fn is_duplicate(&self) -> bool {
        self.rpc_code() == Some(CODE_DUPLICATE_ENTRY)
    }

    /// Answers meaning the requested state is already in place.
    pub fn is_no_op(&self) -> bool {
        matches!(
            self.rpc_code(),
            Some(CODE_EMPTY_MODLIST | CODE_ALREADY_ACTIVE | CODE_ALREADY_INACTIVE)
        )
    }
}

impl From<FreeIpaError> for ConnectorError {
    fn from(err: FreeIpaError) -> Self {
        match err {
            FreeIpaError::Config(message) => ConnectorError::InvalidConfiguration { message },
            FreeIpaError::Authentication(_) => ConnectorError::AuthenticationFailed,
            FreeIpaError::Http(e) if e.is_connect() || e.is_timeout() => {
                ConnectorError::connection_failed_with_source("FreeIPA unreachable", e)
            }
            FreeIpaError::Http(e) => ConnectorError::network_with_source("FreeIPA request failed", e),
            FreeIpaError::Json(e) => ConnectorError::InvalidData {
                message: e.to_string(),
            },
            FreeIpaError::Rpc {
                code: CODE_NOT_FOUND,
                message,
                ..
            } => ConnectorError::ObjectNotFound { identifier: message },
            FreeIpaError::Rpc {
                code: CODE_DUPLICATE_ENTRY,
                message,
                ..
            } => ConnectorError::ObjectAlreadyExists { identifier: message },
            FreeIpaError::Rpc {
                code: CODE_ACI_ERROR,
                method,
                ..
            } => ConnectorError::AuthorizationFailed { operation: method },
            other @ (FreeIpaError::Rpc { .. } | FreeIpaError::UnexpectedResponse { .. }) => {
                ConnectorError::operation_failed(other.to_string())
            }
        }
    }
}
