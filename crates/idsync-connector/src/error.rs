//! Collaborator error types
//!
//! Error definitions with connection classification. A connection
//! error aborts a sync run; everything else is isolated to a single entity.

use thiserror::Error;

/// Error raised by a source or target collaborator.
#[derive(Debug, Error)]
pub enum ConnectorError {
    // Connection errors
    /// Failed to establish a connection to the remote system.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connection timed out.
    #[error("connection timeout after {timeout_secs} seconds")]
    ConnectionTimeout { timeout_secs: u64 },

    /// Network error during communication.
    #[error("network error: {message}")]
    NetworkError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The collaborator was used before `connect` succeeded.
    #[error("not connected: {system}")]
    NotConnected { system: String },

    // Authentication errors
    /// Invalid credentials provided.
    #[error("authentication failed: invalid credentials")]
    AuthenticationFailed,

    /// Insufficient permissions for the operation.
    #[error("authorization failed: insufficient permissions for {operation}")]
    AuthorizationFailed { operation: String },

    // Configuration errors
    /// Collaborator configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    // Operation errors
    /// Operation failed.
    #[error("operation failed: {message}")]
    OperationFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Object already exists (create conflict).
    #[error("object already exists: {identifier}")]
    ObjectAlreadyExists { identifier: String },

    /// Object not found where one was required.
    #[error("object not found: {identifier}")]
    ObjectNotFound { identifier: String },

    /// Invalid data returned by the remote system.
    #[error("invalid data: {message}")]
    InvalidData { message: String },

    /// Serialization error.
    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl ConnectorError {
    /// Whether the error means the remote system is unreachable or refused
    /// the session. Such errors are fatal to a sync run.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ConnectorError::ConnectionFailed { .. }
                | ConnectorError::ConnectionTimeout { .. }
                | ConnectorError::NotConnected { .. }
                | ConnectorError::AuthenticationFailed
                | ConnectorError::InvalidConfiguration { .. }
        )
    }

    /// Whether the error reports a create conflict.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ConnectorError::ObjectAlreadyExists { .. })
    }

    /// Error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConnectorError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            ConnectorError::ConnectionTimeout { .. } => "CONNECTION_TIMEOUT",
            ConnectorError::NetworkError { .. } => "NETWORK_ERROR",
            ConnectorError::NotConnected { .. } => "NOT_CONNECTED",
            ConnectorError::AuthenticationFailed => "AUTH_FAILED",
            ConnectorError::AuthorizationFailed { .. } => "AUTHORIZATION_FAILED",
            ConnectorError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            ConnectorError::OperationFailed { .. } => "OPERATION_FAILED",
            ConnectorError::ObjectAlreadyExists { .. } => "OBJECT_EXISTS",
            ConnectorError::ObjectNotFound { .. } => "OBJECT_NOT_FOUND",
            ConnectorError::InvalidData { .. } => "INVALID_DATA",
            ConnectorError::Serialization { .. } => "SERIALIZATION_ERROR",
        }
    }

    // Convenience constructors

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        ConnectorError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error with source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an operation failed error.
    pub fn operation_failed(message: impl Into<String>) -> Self {
        ConnectorError::OperationFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create an operation failed error with source.
    pub fn operation_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::OperationFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a network error with source.
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::NetworkError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        ConnectorError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a not-connected error.
    pub fn not_connected(system: impl Into<String>) -> Self {
        ConnectorError::NotConnected {
            system: system.into(),
        }
    }

    /// Create an already-exists error.
    pub fn already_exists(identifier: impl Into<String>) -> Self {
        ConnectorError::ObjectAlreadyExists {
            identifier: identifier.into(),
        }
    }
}

/// Result type for collaborator operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors() {
        let errors = vec![
            ConnectorError::connection_failed("ldap down"),
            ConnectorError::ConnectionTimeout { timeout_secs: 30 },
            ConnectorError::AuthenticationFailed,
            ConnectorError::not_connected("freeipa"),
        ];

        for err in errors {
            assert!(
                err.is_connection_error(),
                "Expected {} to be a connection error",
                err.error_code()
            );
        }
    }

    #[test]
    fn test_entity_errors_are_not_connection_errors() {
        let errors = vec![
            ConnectorError::operation_failed("user_add failed"),
            ConnectorError::already_exists("jdoe"),
            ConnectorError::ObjectNotFound {
                identifier: "jdoe".to_string(),
            },
            ConnectorError::AuthorizationFailed {
                operation: "group_add".to_string(),
            },
        ];

        for err in errors {
            assert!(
                !err.is_connection_error(),
                "Expected {} to be isolated to one entity",
                err.error_code()
            );
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ConnectorError::AuthenticationFailed.error_code(), "AUTH_FAILED");
        assert_eq!(ConnectorError::already_exists("x").error_code(), "OBJECT_EXISTS");
        assert!(ConnectorError::already_exists("x").is_already_exists());
    }

    #[test]
    fn test_error_display() {
        let err = ConnectorError::ConnectionTimeout { timeout_secs: 30 };
        assert_eq!(err.to_string(), "connection timeout after 30 seconds");

        let err = ConnectorError::already_exists("jdoe");
        assert_eq!(err.to_string(), "object already exists: jdoe");
    }

    #[test]
    fn test_error_with_source() {
        let source_err = std::io::Error::new(std::io::ErrorKind::Other, "refused");
        let err = ConnectorError::connection_failed_with_source("bind failed", source_err);

        assert!(err.is_connection_error());
        if let ConnectorError::ConnectionFailed { source, .. } = &err {
            assert!(source.is_some());
        } else {
            panic!("Expected ConnectionFailed variant");
        }
    }
}
