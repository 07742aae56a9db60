//! Error types for the Entra ID source.

use idsync_connector::error::ConnectorError;
use thiserror::Error;

/// Result type alias using `EntraError`.
pub type EntraResult<T> = Result<T, EntraError>;

/// Errors that can occur when talking to Entra ID.
#[derive(Debug, Error)]
pub enum EntraError {
    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// `OAuth2` authentication error.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Microsoft Graph API error.
    #[error("Graph API error: {code} - {message}")]
    GraphApi {
        code: String,
        message: String,
        inner_error: Option<String>,
    },

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit retries exhausted.
    #[error("Rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Permission denied.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl From<EntraError> for ConnectorError {
    fn from(err: EntraError) -> Self {
        match err {
            EntraError::Config(message) => ConnectorError::InvalidConfiguration { message },
            EntraError::Auth(message) => {
                ConnectorError::connection_failed(format!("Entra authentication failed: {message}"))
            }
            EntraError::Http(e) if e.is_connect() || e.is_timeout() => {
                ConnectorError::connection_failed_with_source("Microsoft Graph unreachable", e)
            }
            EntraError::Http(e) => ConnectorError::network_with_source("Graph request failed", e),
            EntraError::NotFound(identifier) => ConnectorError::ObjectNotFound { identifier },
            EntraError::PermissionDenied(operation) => {
                ConnectorError::AuthorizationFailed { operation }
            }
            EntraError::Json(e) => ConnectorError::InvalidData {
                message: e.to_string(),
            },
            EntraError::Url(e) => ConnectorError::invalid_configuration(e.to_string()),
            other @ (EntraError::GraphApi { .. } | EntraError::RateLimited { .. }) => {
                ConnectorError::operation_failed(other.to_string())
            }
        }
    }
}
