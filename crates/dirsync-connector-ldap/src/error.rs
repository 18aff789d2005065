//! Directory client error types
//!
//! Errors are classified so callers can tell a legitimate negative result
//! (`NoSuchObject`) apart from transport and protocol failures.

use thiserror::Error;

/// LDAP result code: the target entry does not exist.
pub const RC_NO_SUCH_OBJECT: u32 = 32;

/// LDAP result code: bind credentials rejected.
pub const RC_INVALID_CREDENTIALS: u32 = 49;

/// LDAP result code: an entry with this DN already exists.
pub const RC_ALREADY_EXISTS: u32 = 68;

/// Error that can occur during directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Failed to establish the network connection or handshake.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An operation was attempted without a bound session.
    #[error("not connected to the directory")]
    NotConnected,

    /// The administrative bind was rejected.
    #[error("authentication failed: invalid credentials for {bind_dn}")]
    AuthenticationFailed { bind_dn: String },

    /// The entry (or search base) does not exist.
    #[error("no such object: {dn}")]
    NoSuchObject { dn: String },

    /// An entry with the same DN already exists.
    #[error("entry already exists: {dn}")]
    AlreadyExists { dn: String },

    /// The server answered with a non-success result code.
    #[error("{operation} failed with code {code}: {message}")]
    OperationFailed {
        operation: &'static str,
        code: u32,
        message: String,
    },

    /// The request never produced a server result (I/O, encoding, timeout).
    #[error("{operation} failed: {message}")]
    Protocol {
        operation: &'static str,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Client configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl DirectoryError {
    /// Whether this error means the addressed entry is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DirectoryError::NoSuchObject { .. })
    }

    /// Whether the session should be considered unusable after this error.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DirectoryError::ConnectionFailed { .. }
                | DirectoryError::NotConnected
                | DirectoryError::AuthenticationFailed { .. }
        )
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            DirectoryError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            DirectoryError::NotConnected => "NOT_CONNECTED",
            DirectoryError::AuthenticationFailed { .. } => "AUTH_FAILED",
            DirectoryError::NoSuchObject { .. } => "NO_SUCH_OBJECT",
            DirectoryError::AlreadyExists { .. } => "ALREADY_EXISTS",
            DirectoryError::OperationFailed { .. } => "OPERATION_FAILED",
            DirectoryError::Protocol { .. } => "PROTOCOL_ERROR",
            DirectoryError::InvalidConfiguration { .. } => "INVALID_CONFIG",
        }
    }

    /// Classify a server result code for an operation against `dn`.
    ///
    /// Returns `None` for success (code 0).
    pub fn from_result_code(
        operation: &'static str,
        dn: &str,
        code: u32,
        text: &str,
    ) -> Option<Self> {
        match code {
            0 => None,
            RC_NO_SUCH_OBJECT => Some(DirectoryError::NoSuchObject { dn: dn.to_string() }),
            RC_INVALID_CREDENTIALS => Some(DirectoryError::AuthenticationFailed {
                bind_dn: dn.to_string(),
            }),
            RC_ALREADY_EXISTS => Some(DirectoryError::AlreadyExists { dn: dn.to_string() }),
            _ => Some(DirectoryError::OperationFailed {
                operation,
                code,
                message: text.to_string(),
            }),
        }
    }

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        DirectoryError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error with source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        DirectoryError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a protocol error with source.
    pub fn protocol_with_source(
        operation: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        DirectoryError::Protocol {
            operation,
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
